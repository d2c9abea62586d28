//! Persistent user account entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filehaven_core::{DomainError, Entity, UserId};

use crate::role::Role;

/// A registered user.
///
/// # Invariants
/// - Email is stored trimmed and lowercased; lookups are case-insensitive.
/// - The role set is never empty; registration starts with the base role.
/// - Inactive accounts cannot resolve an [`crate::Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub active: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserAccount {
    /// Validate registration input and build the account.
    ///
    /// The caller supplies an already-computed password hash; hashing lives
    /// in [`crate::password`] so this stays deterministic.
    pub fn register(
        email: &str,
        display_name: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }

        if password_hash.is_empty() {
            return Err(DomainError::validation("password hash cannot be empty"));
        }

        Ok(Self {
            id: UserId::new(),
            email,
            display_name: display_name.to_string(),
            password_hash,
            active: true,
            roles: vec![Role::USER],
            created_at: now,
            last_login_at: None,
        })
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

impl Entity for UserAccount {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_normalizes_email() {
        let account = UserAccount::register(
            "  Alice@Example.COM ",
            " Alice Smith ",
            "hash".to_string(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(account.email, "alice@example.com");
        assert_eq!(account.display_name, "Alice Smith");
        assert!(account.active);
        assert_eq!(account.roles, vec![Role::USER]);
        assert!(account.last_login_at.is_none());
    }

    #[test]
    fn register_rejects_invalid_email() {
        let result = UserAccount::register("not-an-email", "Bob", "hash".to_string(), Utc::now());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn register_rejects_blank_display_name() {
        let result = UserAccount::register("bob@example.com", "  ", "hash".to_string(), Utc::now());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn record_login_sets_timestamp() {
        let mut account =
            UserAccount::register("bob@example.com", "Bob", "hash".to_string(), Utc::now())
                .unwrap();
        let at = Utc::now();
        account.record_login(at);
        assert_eq!(account.last_login_at, Some(at));
    }
}
