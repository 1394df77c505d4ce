use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};

use fintrack_domain::{
    Amount, Budget, BudgetId, Entry, EntryChanges, EntryId, EntryKind, NewBudget, NewEntry, User,
    UserId,
};

use super::{LedgerStore, PurgeReport, Reconciliation};
use crate::CoreError;

/// Volatile [`LedgerStore`] used by tests and ephemeral sessions.
///
/// All compound operations run under a single lock, which makes them atomic.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    expenses: Table<Entry>,
    income: Table<Entry>,
    budgets: Table<Budget>,
}

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl MemoryState {
    fn entries(&self, kind: EntryKind) -> &Table<Entry> {
        match kind {
            EntryKind::Expense => &self.expenses,
            EntryKind::Income => &self.income,
        }
    }

    fn entries_mut(&mut self, kind: EntryKind) -> &mut Table<Entry> {
        match kind {
            EntryKind::Expense => &mut self.expenses,
            EntryKind::Income => &mut self.income,
        }
    }

    fn total_of(&self, uid: &UserId) -> Result<Amount, CoreError> {
        self.users
            .get(uid)
            .map(|user| user.total)
            .ok_or_else(|| CoreError::UnknownUser(uid.clone()))
    }

    fn set_total(&mut self, uid: &UserId, total: Amount) {
        if let Some(user) = self.users.get_mut(uid) {
            user.total = total;
        }
    }

    fn computed_total(&self, uid: &UserId) -> Result<Amount, CoreError> {
        let mut total = Amount::ZERO;
        for kind in EntryKind::ALL {
            for entry in self.entries(kind).rows.values() {
                if &entry.uid == uid {
                    total = kind
                        .apply_to(total, entry.amount)
                        .ok_or_else(|| CoreError::balance_overflow(uid))?;
                }
            }
        }
        Ok(total)
    }
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Storage("in-memory store lock poisoned".into()))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert_user(&self, user: &User) -> Result<bool, CoreError> {
        let mut state = self.state()?;
        if state.users.contains_key(&user.uid) {
            return Ok(false);
        }
        state.users.insert(user.uid.clone(), user.clone());
        Ok(true)
    }

    fn get_user(&self, uid: &UserId) -> Result<Option<User>, CoreError> {
        Ok(self.state()?.users.get(uid).cloned())
    }

    fn insert_entry(
        &self,
        kind: EntryKind,
        entry: &NewEntry,
        timestamp: DateTime<Utc>,
    ) -> Result<Entry, CoreError> {
        let mut state = self.state()?;
        let total = kind
            .apply_to(state.total_of(&entry.uid)?, entry.amount)
            .ok_or_else(|| CoreError::balance_overflow(&entry.uid))?;
        let table = state.entries_mut(kind);
        let id = EntryId(table.allocate());
        let stored = entry.clone().into_entry(id, timestamp);
        table.rows.insert(id.0, stored.clone());
        state.set_total(&stored.uid, total);
        Ok(stored)
    }

    fn get_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<Entry>, CoreError> {
        Ok(self.state()?.entries(kind).rows.get(&id.0).cloned())
    }

    fn update_entry(
        &self,
        kind: EntryKind,
        id: EntryId,
        changes: &EntryChanges,
    ) -> Result<Option<Entry>, CoreError> {
        let mut state = self.state()?;
        let Some(mut updated) = state.entries(kind).rows.get(&id.0).cloned() else {
            return Ok(None);
        };
        let previous = updated.amount;
        changes.apply_to(&mut updated);
        let total = kind
            .revert_from(state.total_of(&updated.uid)?, previous)
            .and_then(|total| kind.apply_to(total, updated.amount))
            .ok_or_else(|| CoreError::balance_overflow(&updated.uid))?;
        state.entries_mut(kind).rows.insert(id.0, updated.clone());
        state.set_total(&updated.uid, total);
        Ok(Some(updated))
    }

    fn delete_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<Entry>, CoreError> {
        let mut state = self.state()?;
        let Some(entry) = state.entries(kind).rows.get(&id.0) else {
            return Ok(None);
        };
        let uid = entry.uid.clone();
        let total = kind
            .revert_from(state.total_of(&uid)?, entry.amount)
            .ok_or_else(|| CoreError::balance_overflow(&uid))?;
        let removed = state.entries_mut(kind).rows.remove(&id.0);
        state.set_total(&uid, total);
        Ok(removed)
    }

    fn list_entries(&self, uid: &UserId, kind: EntryKind) -> Result<Vec<Entry>, CoreError> {
        Ok(self
            .state()?
            .entries(kind)
            .rows
            .values()
            .filter(|entry| &entry.uid == uid)
            .cloned()
            .collect())
    }

    fn insert_budget(&self, budget: &NewBudget) -> Result<Budget, CoreError> {
        let mut state = self.state()?;
        if !state.users.contains_key(&budget.uid) {
            return Err(CoreError::UnknownUser(budget.uid.clone()));
        }
        let id = BudgetId(state.budgets.allocate());
        let stored = budget.clone().into_budget(id);
        state.budgets.rows.insert(id.0, stored.clone());
        Ok(stored)
    }

    fn list_budgets(&self, uid: &UserId) -> Result<Vec<Budget>, CoreError> {
        Ok(self
            .state()?
            .budgets
            .rows
            .values()
            .filter(|budget| &budget.uid == uid)
            .cloned()
            .collect())
    }

    fn update_budget_limit(
        &self,
        uid: &UserId,
        category: &str,
        limit: Amount,
    ) -> Result<usize, CoreError> {
        let mut state = self.state()?;
        let mut changed = 0;
        for budget in state.budgets.rows.values_mut() {
            if &budget.uid == uid && budget.category == category {
                budget.limit = limit;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn delete_budgets(&self, uid: &UserId, category: &str) -> Result<usize, CoreError> {
        let mut state = self.state()?;
        let before = state.budgets.rows.len();
        state
            .budgets
            .rows
            .retain(|_, budget| !(&budget.uid == uid && budget.category == category));
        Ok(before - state.budgets.rows.len())
    }

    fn purge_user_data(&self, uid: &UserId) -> Result<PurgeReport, CoreError> {
        let mut state = self.state()?;
        let mut report = PurgeReport::default();

        let before = state.expenses.rows.len();
        state.expenses.rows.retain(|_, entry| &entry.uid != uid);
        report.expenses = before - state.expenses.rows.len();

        let before = state.income.rows.len();
        state.income.rows.retain(|_, entry| &entry.uid != uid);
        report.income = before - state.income.rows.len();

        let before = state.budgets.rows.len();
        state.budgets.rows.retain(|_, budget| &budget.uid != uid);
        report.budgets = before - state.budgets.rows.len();

        if let Some(user) = state.users.get_mut(uid) {
            report.previous_total = Some(user.total);
            user.total = Amount::ZERO;
        }
        Ok(report)
    }

    fn reconcile_total(&self, uid: &UserId) -> Result<Option<Reconciliation>, CoreError> {
        let mut state = self.state()?;
        if !state.users.contains_key(uid) {
            return Ok(None);
        }
        let computed = state.computed_total(uid)?;
        let Some(user) = state.users.get_mut(uid) else {
            return Ok(None);
        };
        let stored = user.total;
        user.total = computed;
        Ok(Some(Reconciliation { stored, computed }))
    }
}
