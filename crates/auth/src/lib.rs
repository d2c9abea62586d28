//! `filehaven-auth` — identity resolution and the authorization engine.
//!
//! This crate is intentionally decoupled from HTTP and storage. Storage is
//! reached only through the ports in [`ledger`] and [`resolver`]; both HTTP
//! enforcement adapters translate into the single decision function in
//! [`engine`].

pub mod account;
pub mod capability;
pub mod claims;
pub mod engine;
pub mod identity;
pub mod ledger;
pub mod mask;
pub mod password;
pub mod resolver;
pub mod role;
pub mod token;

pub use account::UserAccount;
pub use capability::Capability;
pub use claims::{AccessClaims, ClaimsError, validate_claims};
pub use engine::{AccessBasis, AuthorizationEngine};
pub use identity::Identity;
pub use ledger::{FileIndex, LedgerEntry, LedgerError, PermissionLedger};
pub use mask::PermissionMask;
pub use resolver::{IdentityDirectory, TokenIdentityService};
pub use role::{Blanket, Role, blanket_access};
pub use token::{Hs256Tokens, TokenError};
