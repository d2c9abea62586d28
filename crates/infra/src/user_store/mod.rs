//! User account storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use filehaven_auth::UserAccount;
use filehaven_core::UserId;

use crate::error::StoreError;

mod in_memory;
mod postgres;

pub use in_memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

/// Storage contract for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with [`StoreError::Duplicate`] when the
    /// email is already registered (case-insensitive).
    async fn insert(&self, account: &UserAccount) -> Result<(), StoreError>;

    /// Case-insensitive email lookup, active or not.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Lookup by id, active accounts only.
    async fn find_active(&self, user_id: UserId) -> Result<Option<UserAccount>, StoreError>;

    /// Refresh the last-login timestamp.
    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
}
