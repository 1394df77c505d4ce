//! Expense and income writes with balance maintenance.

use std::sync::Arc;

use tracing::debug;

use fintrack_domain::{Entry, EntryChanges, EntryId, EntryKind, NewEntry, UserId};

use crate::{error::CoreResult, storage::LedgerStore, time::Clock};

/// Records, edits and removes ledger entries.
///
/// Each write and its effect on the owner's running balance are applied by the
/// store as one atomic unit.
#[derive(Clone)]
pub struct EntryService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl EntryService {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Records an expense and lowers the owner's total by its amount.
    pub fn add_expense(&self, entry: NewEntry) -> CoreResult<Entry> {
        self.add(EntryKind::Expense, entry)
    }

    /// Records income and raises the owner's total by its amount.
    pub fn add_income(&self, entry: NewEntry) -> CoreResult<Entry> {
        self.add(EntryKind::Income, entry)
    }

    pub fn add(&self, kind: EntryKind, entry: NewEntry) -> CoreResult<Entry> {
        let stored = self.store.insert_entry(kind, &entry, self.clock.now())?;
        debug!(
            uid = %stored.uid,
            id = %stored.id,
            kind = %kind,
            amount = stored.amount.units(),
            "entry recorded"
        );
        Ok(stored)
    }

    pub fn get(&self, kind: EntryKind, id: EntryId) -> CoreResult<Option<Entry>> {
        self.store.get_entry(kind, id)
    }

    /// Applies `changes` and shifts the owner's total by the amount difference.
    /// Returns `false` when the entry does not exist.
    pub fn update(&self, kind: EntryKind, id: EntryId, changes: EntryChanges) -> CoreResult<bool> {
        let updated = self.store.update_entry(kind, id, &changes)?;
        if let Some(entry) = &updated {
            debug!(uid = %entry.uid, id = %id, kind = %kind, "entry updated");
        }
        Ok(updated.is_some())
    }

    pub fn delete_expense(&self, id: EntryId) -> CoreResult<bool> {
        self.delete(EntryKind::Expense, id)
    }

    pub fn delete_income(&self, id: EntryId) -> CoreResult<bool> {
        self.delete(EntryKind::Income, id)
    }

    /// Removes an entry and reverses its balance effect. Returns `false` and
    /// leaves every total untouched when the id does not exist.
    pub fn delete(&self, kind: EntryKind, id: EntryId) -> CoreResult<bool> {
        match self.store.delete_entry(kind, id)? {
            Some(removed) => {
                debug!(uid = %removed.uid, id = %id, kind = %kind, "entry deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn list(&self, uid: &UserId, kind: EntryKind) -> CoreResult<Vec<Entry>> {
        self.store.list_entries(uid, kind)
    }
}
