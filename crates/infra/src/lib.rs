//! `filehaven-infra` — storage implementations behind the domain ports.
//!
//! Every store comes in two flavors: a Postgres implementation (sqlx pool)
//! and an in-memory implementation used for tests and single-process
//! deployments. Expected table shapes are documented on the Postgres
//! modules; the schema is provisioned externally.

pub mod accounts;
pub mod content_store;
pub mod error;
pub mod file_store;
pub mod identity_store;
pub mod ledger_store;
pub mod user_store;

pub use accounts::{AccountError, AccountService, AuthSession};
pub use content_store::{ContentStore, FsContentStore, InMemoryContentStore};
pub use error::StoreError;
pub use file_store::{FileStore, InMemoryFileStore, PostgresFileStore};
pub use identity_store::{InMemoryIdentityDirectory, PostgresIdentityDirectory};
pub use ledger_store::{InMemoryPermissionLedger, PostgresPermissionLedger};
pub use user_store::{InMemoryUserStore, PostgresUserStore, UserStore};
