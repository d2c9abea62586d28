use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use filehaven_core::DomainError;

use crate::{
    account::UserAccount,
    claims::{AccessClaims, validate_claims},
};

/// Token lifetime. Expiry is never later than this after issuance.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, structure, or expiry check failed. The variant carries no
    /// reason on purpose: callers surface it as a generic rejection.
    #[error("token rejected")]
    Rejected,

    #[error("token encoding failed: {0}")]
    Encoding(jsonwebtoken::errors::Error),
}

/// HS256 token signing and verification.
///
/// The signing secret is validated once at construction; an unset secret is
/// a configuration failure for the whole identity subsystem and must be
/// surfaced at startup, not discovered as mysterious denials at first use.
pub struct Hs256Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256Tokens {
    pub fn from_secret(secret: &str) -> Result<Self, DomainError> {
        if secret.trim().is_empty() {
            return Err(DomainError::configuration("JWT signing secret is not set"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Zero clock-skew tolerance on expiry.
        validation.leeway = 0;
        validation.validate_exp = true;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token for an account. Returns the encoded token and its
    /// expiry timestamp.
    pub fn issue(
        &self,
        account: &UserAccount,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = now + Duration::hours(TOKEN_LIFETIME_HOURS);
        let claims = AccessClaims {
            sub: account.id,
            email: account.email.clone(),
            name: account.display_name.clone(),
            roles: account.roles.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Encoding)?;
        Ok((token, expires_at))
    }

    /// Decode and verify signature + expiry, returning the embedded claims.
    ///
    /// The deterministic claim validation runs on top of the library's
    /// checks so the zero-leeway expiry and the 24-hour lifetime cap hold
    /// exactly.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Rejected)?;
        validate_claims(&claims, Utc::now()).map_err(|_| TokenError::Rejected)?;
        Ok(claims)
    }

    /// Signature/expiry check only, without a user lookup. Used by
    /// lightweight validation endpoints.
    pub fn verify(&self, token: &str) -> bool {
        !token.is_empty() && self.decode(token).is_ok()
    }
}
