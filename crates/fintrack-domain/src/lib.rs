//! fintrack-domain
//!
//! Pure domain models (User, Entry, Budget, Transaction).
//! No I/O, no storage. Only data types and core enums.

pub mod budget;
pub mod common;
pub mod entry;
pub mod transaction;
pub mod user;

pub use budget::*;
pub use common::*;
pub use entry::*;
pub use transaction::*;
pub use user::*;
