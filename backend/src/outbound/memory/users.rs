//! In-memory identity store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, Role, User, UserAccount, UserId};

use super::lock;

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    accounts: Mutex<HashMap<UserId, UserAccount>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(
    accounts: &HashMap<UserId, UserAccount>,
    email: &Email,
    except: Option<&UserId>,
) -> bool {
    accounts
        .values()
        .any(|account| account.user.email() == email && Some(account.user.id()) != except)
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.accounts).get(id).map(|account| account.user.clone()))
    }

    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(lock(&self.accounts)
            .values()
            .find(|account| account.user.email() == email)
            .cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let accounts = lock(&self.accounts);
        Ok(ids
            .iter()
            .filter_map(|id| accounts.get(id))
            .map(|account| account.user.clone())
            .collect())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut users: Vec<User> = lock(&self.accounts)
            .values()
            .map(|account| account.user.clone())
            .collect();
        users.sort_by(|a, b| {
            a.name()
                .as_ref()
                .cmp(b.name().as_ref())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(users)
    }

    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut accounts = lock(&self.accounts);
        if email_taken(&accounts, account.user.email(), None) {
            return Err(UserPersistenceError::duplicate_email(
                account.user.email().as_ref(),
            ));
        }
        accounts.insert(*account.user.id(), account.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut accounts = lock(&self.accounts);
        if email_taken(&accounts, user.email(), Some(user.id())) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        match accounts.get_mut(user.id()) {
            Some(account) => {
                account.user = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        Ok(lock(&self.accounts).remove(id).is_some())
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, UserPersistenceError> {
        let count = lock(&self.accounts)
            .values()
            .filter(|account| account.user.role() == role)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}
