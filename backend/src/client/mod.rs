//! HTTP client for front ends.
//!
//! [`ApiClient`] wraps the `/api/v1` routes with typed methods and keeps
//! the signed-in [`ClientSession`]. [`UnreadCountPoller`] refreshes the
//! unread-notification badge in the background.

mod api;
mod session;
mod unread_poller;

pub use api::{ApiClient, ClientError};
pub use session::ClientSession;
pub use unread_poller::{UnreadCountPoller, UnreadCountSource};
