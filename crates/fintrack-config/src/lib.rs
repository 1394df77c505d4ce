//! fintrack-config
//!
//! Persistent application settings: where the ledger database lives, the log
//! filter and display preferences, plus JSON persistence helpers.

pub mod error;
pub mod format;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use format::grouping_separator;
pub use manager::ConfigManager;
pub use model::Config;
