//! Process-wide configuration, read once at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use filehaven_core::DomainError;

/// Everything the process needs, validated before anything is served.
///
/// A missing signing secret is fatal here: treating it as "deny" later
/// would look exactly like bad credentials to every caller, which is a
/// silent denial-of-service. Fail fast instead.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,

    /// When unset, in-memory stores back the process.
    pub database_url: Option<String>,

    /// When unset, file content is held in memory.
    pub storage_dir: Option<PathBuf>,

    /// Administrator account to seed at startup.
    pub admin: Option<AdminSeed>,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() {
            return Err(DomainError::configuration(
                "JWT_SECRET must be set to a non-empty value",
            ));
        }

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|_| {
                DomainError::configuration(format!("BIND_ADDR '{raw}' is not a socket address"))
            })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let admin = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            (Ok(_), Err(_)) | (Err(_), Ok(_)) => {
                return Err(DomainError::configuration(
                    "ADMIN_EMAIL and ADMIN_PASSWORD must be set together",
                ));
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            storage_dir: std::env::var("STORAGE_DIR").ok().map(PathBuf::from),
            admin,
        })
    }

    /// Minimal config for tests: in-memory everything.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.to_string(),
            database_url: None,
            storage_dir: None,
            admin: None,
        }
    }
}
