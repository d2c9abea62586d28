//! Account orchestration: registration and login.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use filehaven_auth::{Hs256Tokens, Role, UserAccount, password};
use filehaven_core::DomainError;

use crate::error::StoreError;
use crate::user_store::UserStore;

/// A successful authentication: the account plus a freshly issued token.
pub struct AuthSession {
    pub account: UserAccount,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AccountError {
    /// Login failed. One variant for every reason (unknown email, wrong
    /// password, inactive account) so callers cannot probe which it was.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already exists")]
    EmailTaken,

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("account store failure: {0}")]
    Store(String),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => AccountError::EmailTaken,
            other => AccountError::Store(other.to_string()),
        }
    }
}

pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<Hs256Tokens>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<Hs256Tokens>) -> Self {
        Self { users, tokens }
    }

    /// Register a new account and issue its first token.
    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<AuthSession, AccountError> {
        if self.users.find_by_email(email).await?.is_some() {
            tracing::info!(event = "security", "registration refused: email already exists");
            return Err(AccountError::EmailTaken);
        }

        let hash = password::hash_password(password)
            .map_err(|e| AccountError::Store(e.to_string()))?;
        let now = Utc::now();
        let account = UserAccount::register(email, display_name, hash, now)?;
        self.users.insert(&account).await?;

        let (token, expires_at) = self
            .tokens
            .issue(&account, now)
            .map_err(|e| AccountError::Store(e.to_string()))?;

        tracing::info!(event = "security", user_id = %account.id, "new user registered");
        Ok(AuthSession {
            account,
            token,
            expires_at,
        })
    }

    /// Authenticate by email + password. Refreshes the last-login timestamp
    /// and issues a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AccountError> {
        let account = self.users.find_by_email(email).await?;

        // Verify against a well-formed dummy hash when the account is
        // missing, so response timing does not reveal whether the email
        // exists.
        let Some(mut account) = account else {
            let _ = password::verify_password(password, EMPTY_ACCOUNT_HASH);
            tracing::info!(event = "security", "failed login attempt");
            return Err(AccountError::InvalidCredentials);
        };

        if !account.active || !password::verify_password(password, &account.password_hash) {
            tracing::info!(event = "security", user_id = %account.id, "failed login attempt");
            return Err(AccountError::InvalidCredentials);
        }

        let now = Utc::now();
        account.record_login(now);
        self.users.record_login(account.id, now).await?;

        let (token, expires_at) = self
            .tokens
            .issue(&account, now)
            .map_err(|e| AccountError::Store(e.to_string()))?;

        tracing::info!(event = "security", user_id = %account.id, "successful login");
        Ok(AuthSession {
            account,
            token,
            expires_at,
        })
    }

    /// Provision the administrator account if it is not present yet.
    /// Idempotent across restarts.
    pub async fn seed_administrator(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), AccountError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Ok(());
        }

        let hash = password::hash_password(password)
            .map_err(|e| AccountError::Store(e.to_string()))?;
        let mut account =
            UserAccount::register(email, "System Administrator", hash, Utc::now())?;
        account.roles = vec![Role::ADMINISTRATOR];

        match self.users.insert(&account).await {
            Ok(()) => {
                tracing::info!(user_id = %account.id, "administrator account seeded");
                Ok(())
            }
            // Lost a race against a concurrent seed; the account exists.
            Err(StoreError::Duplicate(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// bcrypt hash of an unguessable throwaway value, used to equalize login
/// timing for unknown emails.
const EMPTY_ACCOUNT_HASH: &str = "$2b$12$C6UzMDM.H6dfI/f/IKcEeO5EpcGCBNsQbZ4l0QOJ5dOSI5SxGjBMi";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_store::InMemoryUserStore;

    fn service() -> (AccountService, InMemoryUserStore) {
        let users = InMemoryUserStore::new();
        let tokens = Arc::new(Hs256Tokens::from_secret("test-secret").unwrap());
        (
            AccountService::new(Arc::new(users.clone()), tokens),
            users,
        )
    }

    #[tokio::test]
    async fn register_then_login() {
        let (service, _) = service();

        let session = service
            .register("frank@example.com", "Frank", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(session.account.roles, vec![Role::USER]);
        assert!(!session.token.is_empty());

        let session = service
            .login("frank@example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert!(session.account.last_login_at.is_some());
    }

    #[tokio::test]
    async fn login_is_case_insensitive_on_email() {
        let (service, _) = service();
        service
            .register("Grace@Example.com", "Grace", "hunter2hunter2")
            .await
            .unwrap();

        assert!(service
            .login("grace@example.COM", "hunter2hunter2")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn duplicate_registration_is_refused() {
        let (service, _) = service();
        service
            .register("henry@example.com", "Henry", "hunter2hunter2")
            .await
            .unwrap();

        let result = service
            .register("HENRY@example.com", "Henry Again", "hunter2hunter2")
            .await;
        assert!(matches!(result, Err(AccountError::EmailTaken)));
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let (service, _) = service();
        service
            .register("iris@example.com", "Iris", "hunter2hunter2")
            .await
            .unwrap();

        let wrong_password = service.login("iris@example.com", "wrong").await;
        let unknown_email = service.login("nobody@example.com", "wrong").await;
        assert_eq!(
            wrong_password.err().unwrap().to_string(),
            unknown_email.err().unwrap().to_string()
        );
    }

    #[tokio::test]
    async fn deactivated_accounts_cannot_login() {
        let (service, users) = service();
        let session = service
            .register("jack@example.com", "Jack", "hunter2hunter2")
            .await
            .unwrap();

        // Flip the active flag behind the service's back.
        let mut account = users.get(session.account.id).unwrap();
        account.deactivate();
        users.insert_replacing(&account);

        assert!(matches!(
            service.login("jack@example.com", "hunter2hunter2").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn seed_administrator_is_idempotent() {
        let (service, _) = service();
        service
            .seed_administrator("admin@example.com", "Admin@123")
            .await
            .unwrap();
        service
            .seed_administrator("admin@example.com", "Admin@123")
            .await
            .unwrap();

        let session = service.login("admin@example.com", "Admin@123").await.unwrap();
        assert_eq!(session.account.roles, vec![Role::ADMINISTRATOR]);
    }
}
