//! In-memory user store for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use filehaven_auth::UserAccount;
use filehaven_core::UserId;

use super::UserStore;
use crate::error::StoreError;

#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    accounts: Arc<Mutex<HashMap<UserId, UserAccount>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, user_id: UserId) -> Option<UserAccount> {
        self.accounts.lock().unwrap().get(&user_id).cloned()
    }

    /// Overwrite an account in place, bypassing the uniqueness check. For
    /// wiring code (admin seed) and tests that mutate state directly.
    pub fn insert_replacing(&self, account: &UserAccount) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.id, account.clone());
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, account: &UserAccount) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(StoreError::Duplicate(account.email.clone()));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn find_active(&self, user_id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&user_id)
            .filter(|a| a.active)
            .cloned())
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        account.record_login(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str) -> UserAccount {
        UserAccount::register(email, "Someone", "hash".to_string(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn email_uniqueness_is_case_insensitive() {
        let store = InMemoryUserStore::new();
        store.insert(&account("dana@example.com")).await.unwrap();

        let dup = account("DANA@example.com");
        assert!(matches!(
            store.insert(&dup).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn find_by_email_ignores_case() {
        let store = InMemoryUserStore::new();
        let a = account("dana@example.com");
        store.insert(&a).await.unwrap();

        let found = store.find_by_email("Dana@Example.Com").await.unwrap();
        assert_eq!(found.map(|f| f.id), Some(a.id));
    }

    #[tokio::test]
    async fn find_active_excludes_deactivated_accounts() {
        let store = InMemoryUserStore::new();
        let mut a = account("dana@example.com");
        a.deactivate();
        store.insert(&a).await.unwrap();

        assert!(store.find_active(a.id).await.unwrap().is_none());
    }
}
