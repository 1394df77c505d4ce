//! Budget writes plus the active-budget, usage and progress queries.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use fintrack_domain::{Amount, Budget, BudgetStatus, EntryKind, NewBudget, UserId};

use crate::{error::CoreResult, storage::LedgerStore, time::Clock};

/// Manages category budgets and evaluates them against recorded expenses.
#[derive(Clone)]
pub struct BudgetService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl BudgetService {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn add(&self, budget: NewBudget) -> CoreResult<Budget> {
        let stored = self.store.insert_budget(&budget)?;
        debug!(uid = %stored.uid, id = %stored.id, category = %stored.category, "budget created");
        Ok(stored)
    }

    /// Sets a new limit on the `(uid, category)` budget. Returns whether any row changed.
    pub fn update_limit(&self, uid: &UserId, category: &str, limit: Amount) -> CoreResult<bool> {
        let changed = self.store.update_budget_limit(uid, category, limit)?;
        debug!(uid = %uid, category, rows = changed, "budget limit updated");
        Ok(changed > 0)
    }

    /// Deletes the `(uid, category)` budget. Returns whether any row was removed.
    pub fn delete(&self, uid: &UserId, category: &str) -> CoreResult<bool> {
        let removed = self.store.delete_budgets(uid, category)?;
        debug!(uid = %uid, category, rows = removed, "budget deleted");
        Ok(removed > 0)
    }

    pub fn list(&self, uid: &UserId) -> CoreResult<Vec<Budget>> {
        self.store.list_budgets(uid)
    }

    /// Budgets whose inclusive date range contains today.
    pub fn active_budgets(&self, uid: &UserId) -> CoreResult<Vec<Budget>> {
        let today = self.clock.today();
        Ok(active_on(self.store.list_budgets(uid)?, today))
    }

    /// The first active budget for `category`, by id, when several overlap.
    pub fn active_budget_for(&self, uid: &UserId, category: &str) -> CoreResult<Option<Budget>> {
        Ok(self
            .active_budgets(uid)?
            .into_iter()
            .find(|budget| budget.category == category))
    }

    /// All-time spending in `category`, independent of any budget window.
    pub fn usage(&self, uid: &UserId, category: &str) -> CoreResult<Amount> {
        Ok(self
            .store
            .list_entries(uid, EntryKind::Expense)?
            .iter()
            .filter(|entry| entry.category == category)
            .map(|entry| entry.amount)
            .sum())
    }

    /// Spending in the budget's category restricted to the budget's own date range.
    pub fn usage_in_window(&self, budget: &Budget) -> CoreResult<Amount> {
        let range = budget.range();
        Ok(self
            .store
            .list_entries(&budget.uid, EntryKind::Expense)?
            .iter()
            .filter(|entry| entry.category == budget.category && range.contains(entry.date))
            .map(|entry| entry.amount)
            .sum())
    }

    /// `limit - usage` of the active budget; negative when overspent. `None`
    /// when the category has no active budget.
    pub fn remaining(&self, uid: &UserId, category: &str) -> CoreResult<Option<Amount>> {
        let Some(budget) = self.active_budget_for(uid, category)? else {
            return Ok(None);
        };
        Ok(Some(budget.limit - self.usage(uid, category)?))
    }

    /// Usage as a rounded percentage of the active budget's limit.
    pub fn progress(&self, uid: &UserId, category: &str) -> CoreResult<u32> {
        let Some(budget) = self.active_budget_for(uid, category)? else {
            return Ok(0);
        };
        Ok(progress_percent(self.usage(uid, category)?, budget.limit))
    }

    /// Usage, remaining amount and progress for every active budget.
    pub fn statuses(&self, uid: &UserId) -> CoreResult<Vec<BudgetStatus>> {
        let expenses = self.store.list_entries(uid, EntryKind::Expense)?;
        let active = self.active_budgets(uid)?;
        Ok(active
            .into_iter()
            .map(|budget| {
                let usage: Amount = expenses
                    .iter()
                    .filter(|entry| entry.category == budget.category)
                    .map(|entry| entry.amount)
                    .sum();
                BudgetStatus {
                    remaining: budget.limit - usage,
                    progress_percent: progress_percent(usage, budget.limit),
                    usage,
                    budget,
                }
            })
            .collect())
    }
}

/// Filters `budgets` to those whose range contains `date`, keeping their order.
pub fn active_on(budgets: Vec<Budget>, date: NaiveDate) -> Vec<Budget> {
    budgets
        .into_iter()
        .filter(|budget| budget.is_active_on(date))
        .collect()
}

/// `round(usage / limit * 100)`; zero for a non-positive limit or negative usage.
/// Overspending yields values above 100.
pub fn progress_percent(usage: Amount, limit: Amount) -> u32 {
    if !limit.is_positive() || usage.units() <= 0 {
        return 0;
    }
    let percent = (usage.as_f64() / limit.as_f64() * 100.0).round();
    if percent >= u32::MAX as f64 {
        u32::MAX
    } else {
        percent as u32
    }
}
