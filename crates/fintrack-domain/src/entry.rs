//! Expense and income records.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Amount, EntryId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Distinguishes the two structurally identical ledger record types.
pub enum EntryKind {
    Expense,
    Income,
}

impl EntryKind {
    pub const ALL: [EntryKind; 2] = [EntryKind::Expense, EntryKind::Income];

    /// Effect of an entry of this kind on the owner's running balance.
    pub fn balance_effect(self, amount: Amount) -> Amount {
        match self {
            EntryKind::Expense => -amount,
            EntryKind::Income => amount,
        }
    }

    /// `total` after recording an entry of this kind, `None` on overflow.
    pub fn apply_to(self, total: Amount, amount: Amount) -> Option<Amount> {
        match self {
            EntryKind::Expense => total.checked_sub(amount),
            EntryKind::Income => total.checked_add(amount),
        }
    }

    /// `total` after removing an entry of this kind, `None` on overflow.
    pub fn revert_from(self, total: Amount, amount: Amount) -> Option<Amount> {
        match self {
            EntryKind::Expense => total.checked_add(amount),
            EntryKind::Income => total.checked_sub(amount),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Expense => "expense",
            EntryKind::Income => "income",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(EntryKind::Expense),
            "income" => Ok(EntryKind::Income),
            other => Err(format!("unknown entry kind `{other}`")),
        }
    }
}

/// A persisted expense or income record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub uid: UserId,
    pub title: String,
    pub amount: Amount,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Input for a new expense or income record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub uid: UserId,
    pub title: String,
    pub amount: Amount,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    /// Creation instant. Filled from the service clock when absent.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewEntry {
    pub fn new(
        uid: impl Into<UserId>,
        title: impl Into<String>,
        amount: Amount,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            amount,
            category: category.into(),
            date,
            note: None,
            timestamp: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Builds the stored record. The timestamp keeps millisecond precision,
    /// which is what the ledger persists.
    pub fn into_entry(self, id: EntryId, timestamp: DateTime<Utc>) -> Entry {
        Entry {
            id,
            uid: self.uid,
            title: self.title,
            amount: self.amount,
            category: self.category,
            date: self.date,
            note: self.note,
            timestamp: self.timestamp.unwrap_or(timestamp).trunc_subsecs(3),
        }
    }
}

/// Replacement values applied when a record is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChanges {
    pub title: String,
    pub amount: Amount,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl EntryChanges {
    pub fn apply_to(&self, entry: &mut Entry) {
        entry.title = self.title.clone();
        entry.amount = self.amount;
        entry.category = self.category.clone();
        entry.date = self.date;
        entry.note = self.note.clone();
    }
}

impl From<&Entry> for EntryChanges {
    fn from(entry: &Entry) -> Self {
        Self {
            title: entry.title.clone(),
            amount: entry.amount,
            category: entry.category.clone(),
            date: entry.date,
            note: entry.note.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expenses_reduce_and_income_raises_balance() {
        let amount = Amount::new(300);
        assert_eq!(EntryKind::Expense.balance_effect(amount), Amount::new(-300));
        assert_eq!(EntryKind::Income.balance_effect(amount), Amount::new(300));
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Income".parse::<EntryKind>(), Ok(EntryKind::Income));
        assert_eq!(" expense ".parse::<EntryKind>(), Ok(EntryKind::Expense));
        assert!("transfer".parse::<EntryKind>().is_err());
    }

    #[test]
    fn explicit_timestamp_wins_over_fallback() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let explicit = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let fallback = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        let entry = NewEntry::new("u1", "Lunch", Amount::new(12), "Food", date)
            .with_timestamp(explicit)
            .into_entry(EntryId(1), fallback);
        assert_eq!(entry.timestamp, explicit);
    }

    #[test]
    fn stored_timestamp_is_cut_to_milliseconds() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let precise = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let entry = NewEntry::new("u1", "Lunch", Amount::new(12), "Food", date)
            .into_entry(EntryId(1), precise);
        assert_eq!(
            entry.timestamp,
            DateTime::from_timestamp(1_700_000_000, 123_000_000).unwrap()
        );
    }

    #[test]
    fn balance_changes_are_checked() {
        let max = Amount::new(i64::MAX);
        assert_eq!(EntryKind::Income.apply_to(max, Amount::new(1)), None);
        assert_eq!(EntryKind::Expense.revert_from(max, Amount::new(1)), None);
        assert_eq!(
            EntryKind::Expense.apply_to(Amount::new(10), Amount::new(4)),
            Some(Amount::new(6))
        );
        assert_eq!(
            EntryKind::Income.revert_from(Amount::new(10), Amount::new(4)),
            Some(Amount::new(6))
        );
    }
}
