//! FinTrack is a local personal-finance ledger: users, expenses, income and
//! category budgets persisted in SQLite, with a running balance per user and
//! aggregation queries over the ledger.

pub mod app;
pub mod errors;
pub mod utils;

pub use app::FinanceApp;
pub use errors::{FinTrackError, FinTrackResult};
pub use fintrack_config;
pub use fintrack_core;
pub use fintrack_domain;
pub use fintrack_storage_sqlite;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default `fintrack=info` directive.
pub fn init() {
    init_with_filter(utils::DEFAULT_LOG_DIRECTIVE);
}

/// Initializes global tracing with `directive`, typically `Config::log_filter`.
/// Only the first call has an effect.
pub fn init_with_filter(directive: &str) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directive);
        tracing::info!("FinTrack tracing initialized.");
    });
}
