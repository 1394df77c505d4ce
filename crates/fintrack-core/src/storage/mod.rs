//! Persistence seam for the ledger.
//!
//! Every method that touches both a ledger row and the owner's running balance
//! is a compound operation: implementations must apply the row change and the
//! balance change as one atomic unit, or neither.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fintrack_domain::{
    Amount, Budget, Entry, EntryChanges, EntryId, EntryKind, NewBudget, NewEntry, User, UserId,
};

use crate::CoreError;

pub use memory::InMemoryLedgerStore;

/// Row counts removed by a bulk purge of one user's data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub expenses: usize,
    pub income: usize,
    pub budgets: usize,
    /// Balance before it was reset, `None` when the user row does not exist.
    pub previous_total: Option<Amount>,
}

impl PurgeReport {
    /// True when the purge removed nothing and reset nothing.
    pub fn is_noop(&self) -> bool {
        self.expenses == 0
            && self.income == 0
            && self.budgets == 0
            && self.previous_total.map_or(true, |total| total == Amount::ZERO)
    }
}

/// Stored balance compared with the balance recomputed from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub stored: Amount,
    pub computed: Amount,
}

impl Reconciliation {
    pub fn drifted(&self) -> bool {
        self.stored != self.computed
    }
}

/// Abstraction over the relational store holding users, ledger entries and budgets.
pub trait LedgerStore: Send + Sync {
    /// Inserts a user with the given total. Returns `false` when the uid already exists.
    fn insert_user(&self, user: &User) -> Result<bool, CoreError>;

    fn get_user(&self, uid: &UserId) -> Result<Option<User>, CoreError>;

    /// Inserts an entry and applies its balance effect to the owner.
    ///
    /// Fails with [`CoreError::UnknownUser`] without writing anything when the
    /// owner does not exist.
    fn insert_entry(
        &self,
        kind: EntryKind,
        entry: &NewEntry,
        timestamp: DateTime<Utc>,
    ) -> Result<Entry, CoreError>;

    fn get_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<Entry>, CoreError>;

    /// Replaces an entry's editable fields and shifts the owner's balance by the
    /// difference. Returns the updated entry, `None` when the id is unknown.
    fn update_entry(
        &self,
        kind: EntryKind,
        id: EntryId,
        changes: &EntryChanges,
    ) -> Result<Option<Entry>, CoreError>;

    /// Reverses an entry's balance effect and deletes it. Returns the removed
    /// entry, `None` when the id is unknown.
    fn delete_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<Entry>, CoreError>;

    /// Lists a user's entries of one kind in insertion order.
    fn list_entries(&self, uid: &UserId, kind: EntryKind) -> Result<Vec<Entry>, CoreError>;

    fn insert_budget(&self, budget: &NewBudget) -> Result<Budget, CoreError>;

    /// Lists a user's budgets ordered by id.
    fn list_budgets(&self, uid: &UserId) -> Result<Vec<Budget>, CoreError>;

    /// Sets the limit of every budget matching `(uid, category)`. Returns the row count.
    fn update_budget_limit(
        &self,
        uid: &UserId,
        category: &str,
        limit: Amount,
    ) -> Result<usize, CoreError>;

    /// Deletes every budget matching `(uid, category)`. Returns the row count.
    fn delete_budgets(&self, uid: &UserId, category: &str) -> Result<usize, CoreError>;

    /// Deletes all entries and budgets of a user and resets the balance to zero.
    fn purge_user_data(&self, uid: &UserId) -> Result<PurgeReport, CoreError>;

    /// Recomputes the balance from the ledger and stores it. `None` when the
    /// user does not exist.
    fn reconcile_total(&self, uid: &UserId) -> Result<Option<Reconciliation>, CoreError>;
}
