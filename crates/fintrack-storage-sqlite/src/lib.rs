//! fintrack-storage-sqlite
//!
//! SQLite persistence for the ledger: schema creation and upgrades, and a
//! [`fintrack_core::LedgerStore`] implementation whose compound writes run in a
//! single transaction.

pub mod error;
pub mod schema;
pub mod store;

pub use error::StorageError;
pub use schema::SCHEMA_VERSION;
pub use store::SqliteLedgerStore;
