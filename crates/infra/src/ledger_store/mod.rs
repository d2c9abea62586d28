//! Permission ledger implementations.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryPermissionLedger;
pub use postgres::PostgresPermissionLedger;
