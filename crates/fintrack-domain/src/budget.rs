//! Category budgets bounded by a date range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::{Amount, BudgetId, DateRange, DateRangeError, UserId};

/// Spending limit for one category over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub uid: UserId,
    pub category: String,
    pub limit: Amount,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Budget {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// A budget is active on every day of its range, both ends included.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.range().contains(date)
    }
}

/// Input for a new budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBudget {
    pub uid: UserId,
    pub category: String,
    pub limit: Amount,
    pub range: DateRange,
}

impl NewBudget {
    pub fn new(
        uid: impl Into<UserId>,
        category: impl Into<String>,
        limit: Amount,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, DateRangeError> {
        Ok(Self {
            uid: uid.into(),
            category: category.into(),
            limit,
            range: DateRange::new(start_date, end_date)?,
        })
    }

    pub fn into_budget(self, id: BudgetId) -> Budget {
        Budget {
            id,
            uid: self.uid,
            category: self.category,
            limit: self.limit,
            start_date: self.range.start,
            end_date: self.range.end,
        }
    }
}

/// Usage of an active budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub usage: Amount,
    pub remaining: Amount,
    pub progress_percent: u32,
}
