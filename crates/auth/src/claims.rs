use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use filehaven_core::UserId;

use crate::role::Role;

/// JWT claims model (transport-agnostic).
///
/// Timestamps are unix seconds so `exp` participates in standard JWT
/// validation. Role/ownership data in a token is a snapshot from issuance;
/// authorization always re-reads the live records via [`crate::resolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user id the token was issued to.
    pub sub: UserId,

    pub email: String,

    pub name: String,

    /// RBAC roles at issuance time.
    pub roles: Vec<Role>,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiry, unix seconds. At most 24 hours after `iat`.
    pub exp: i64,
}

/// Upper bound on a token's lifetime: expiry is never honored more than 24
/// hours after issuance, whatever the token says.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate claim timestamps with zero clock-skew leeway.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::token`].
pub fn validate_claims(claims: &AccessClaims, now: DateTime<Utc>) -> Result<(), ClaimsError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat || claims.exp - claims.iat > MAX_TOKEN_LIFETIME_SECS {
        return Err(ClaimsError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(ClaimsError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(ClaimsError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims(iat: i64, exp: i64) -> AccessClaims {
        AccessClaims {
            sub: UserId::new(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            roles: vec![Role::USER],
            iat,
            exp,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn valid_inside_window() {
        assert!(validate_claims(&claims(100, 200), at(150)).is_ok());
    }

    #[test]
    fn expiry_has_no_leeway() {
        // The very second of expiry is already rejected.
        assert_eq!(
            validate_claims(&claims(100, 200), at(200)),
            Err(ClaimsError::Expired)
        );
        assert_eq!(
            validate_claims(&claims(100, 200), at(201)),
            Err(ClaimsError::Expired)
        );
    }

    #[test]
    fn issued_in_the_future_is_rejected() {
        assert_eq!(
            validate_claims(&claims(100, 200), at(99)),
            Err(ClaimsError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(
            validate_claims(&claims(200, 100), at(150)),
            Err(ClaimsError::InvalidTimeWindow)
        );
    }

    #[test]
    fn lifetimes_beyond_24_hours_are_rejected() {
        let too_long = claims(0, MAX_TOKEN_LIFETIME_SECS + 1);
        assert_eq!(
            validate_claims(&too_long, at(10)),
            Err(ClaimsError::InvalidTimeWindow)
        );

        let exactly = claims(0, MAX_TOKEN_LIFETIME_SECS);
        assert!(validate_claims(&exactly, at(10)).is_ok());
    }
}
