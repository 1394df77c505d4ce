//! Read models combining expenses and income.

use serde::{Deserialize, Serialize};

use crate::{
    common::Amount,
    entry::{Entry, EntryKind},
};

/// An expense or income record tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(flatten)]
    pub entry: Entry,
}

impl Transaction {
    pub fn new(kind: EntryKind, entry: Entry) -> Self {
        Self { kind, entry }
    }

    /// Signed effect on the running balance.
    pub fn signed_amount(&self) -> Amount {
        self.kind.balance_effect(self.entry.amount)
    }
}

/// Income, expenses and their difference over some set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub income: Amount,
    pub expenses: Amount,
    pub net: Amount,
}

impl PeriodTotals {
    pub fn record(&mut self, kind: EntryKind, amount: Amount) {
        match kind {
            EntryKind::Expense => self.expenses += amount,
            EntryKind::Income => self.income += amount,
        }
        self.net = self.income - self.expenses;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate};

    use super::*;
    use crate::common::{EntryId, UserId};

    #[test]
    fn transactions_serialize_with_type_tag() {
        let entry = Entry {
            id: EntryId(7),
            uid: UserId::new("u1"),
            title: "Salary".into(),
            amount: Amount::new(1000),
            category: "Work".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            note: None,
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
        };
        let json = serde_json::to_value(Transaction::new(EntryKind::Income, entry)).unwrap();
        assert_eq!(json["type"], "income");
        assert_eq!(json["amount"], 1000);
        assert_eq!(json["date"], "2024-01-31");
    }

    #[test]
    fn period_totals_track_net() {
        let mut totals = PeriodTotals::default();
        totals.record(EntryKind::Income, Amount::new(1000));
        totals.record(EntryKind::Expense, Amount::new(300));
        assert_eq!(totals.net, Amount::new(700));
    }
}
