//! fintrack-core
//!
//! Business logic and services for fintrack.
//! Depends on fintrack-domain. No terminal I/O; persistence goes through [`storage::LedgerStore`].

pub mod budget_service;
pub mod entry_service;
pub mod error;
pub mod storage;
pub mod summary_service;
pub mod time;
pub mod user_service;

pub use budget_service::BudgetService;
pub use entry_service::EntryService;
pub use error::{CoreError, CoreResult};
pub use storage::{InMemoryLedgerStore, LedgerStore, PurgeReport, Reconciliation};
pub use summary_service::SummaryService;
pub use time::{Clock, FixedClock, SystemClock};
pub use user_service::{PurgeOutcome, UserService};

use std::sync::Arc;

/// Every service wired to one shared store and clock.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub entries: EntryService,
    pub budgets: BudgetService,
    pub summary: SummaryService,
}

impl Services {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: UserService::new(Arc::clone(&store)),
            entries: EntryService::new(Arc::clone(&store), Arc::clone(&clock)),
            budgets: BudgetService::new(Arc::clone(&store), clock),
            summary: SummaryService::new(store),
        }
    }

    /// Services over a fresh [`InMemoryLedgerStore`].
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(InMemoryLedgerStore::new()), clock)
    }
}
