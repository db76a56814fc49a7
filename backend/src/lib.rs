//! Task assignment and notification service.
//!
//! Administrators assign tasks to people or whole departments and publish
//! notifications; employees work on what is visible to them. The crate is
//! laid out hexagonally: [`domain`] holds types, rules, ports and services,
//! [`inbound`] the Actix Web adapter, [`outbound`] the stores and credential
//! adapters, and [`client`] a typed API client for front ends.

pub mod client;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[doc(hidden)]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
