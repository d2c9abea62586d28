//! Identity resolution from a bearer credential.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use filehaven_core::UserId;

use crate::{identity::Identity, token::Hs256Tokens};

#[derive(Debug, Error)]
#[error("identity directory failure: {0}")]
pub struct DirectoryError(pub String);

/// Fresh load of a user's authorization-relevant state.
///
/// Must return `None` for unknown or inactive users, and must read current
/// roles/ownership/grants on every call — resolution never trusts claims
/// cached in the token, so privilege changes take effect immediately.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn load(&self, user_id: UserId) -> Result<Option<Identity>, DirectoryError>;
}

/// Resolves bearer tokens to identities. Fails closed: any problem with the
/// token, its subject, or the account yields `None`, never an error the
/// caller could use to distinguish reasons.
pub struct TokenIdentityService {
    tokens: Arc<Hs256Tokens>,
    directory: Arc<dyn IdentityDirectory>,
}

impl TokenIdentityService {
    pub fn new(tokens: Arc<Hs256Tokens>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { tokens, directory }
    }

    /// `resolve(token) -> Identity | none`.
    ///
    /// Returns `None` when the token is empty or malformed, the signature or
    /// expiry check fails, the subject does not parse, or the subject does
    /// not correspond to an active account.
    pub async fn resolve(&self, token: &str) -> Option<Identity> {
        if token.trim().is_empty() {
            tracing::debug!(event = "security", "token resolution failed: empty token");
            return None;
        }

        let claims = match self.tokens.decode(token) {
            Ok(claims) => claims,
            Err(_) => {
                tracing::debug!(event = "security", "token resolution failed: rejected token");
                return None;
            }
        };

        match self.directory.load(claims.sub).await {
            Ok(Some(identity)) => Some(identity),
            Ok(None) => {
                tracing::debug!(
                    event = "security",
                    user_id = %claims.sub,
                    "token resolution failed: no active account"
                );
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "identity directory unavailable during resolve");
                None
            }
        }
    }

    /// Signature and expiry checks only; no user lookup.
    pub fn verify(&self, token: &str) -> bool {
        self.tokens.verify(token)
    }
}
