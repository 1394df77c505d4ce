//! Read-side aggregations over a user's ledger.

use std::{cmp::Reverse, collections::BTreeMap, sync::Arc};

use fintrack_domain::{Amount, DateRange, Entry, EntryKind, PeriodTotals, Transaction, UserId};

use crate::{error::CoreResult, storage::LedgerStore};

/// Aggregates ledger entries into category totals and transaction histories.
#[derive(Clone)]
pub struct SummaryService {
    store: Arc<dyn LedgerStore>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn expenses_by_category(&self, uid: &UserId) -> CoreResult<BTreeMap<String, Amount>> {
        self.totals_by_category(uid, EntryKind::Expense)
    }

    pub fn income_by_category(&self, uid: &UserId) -> CoreResult<BTreeMap<String, Amount>> {
        self.totals_by_category(uid, EntryKind::Income)
    }

    /// Sums amounts per category string. Categories are compared verbatim, so
    /// `"Food"` and `"food "` are reported separately.
    pub fn totals_by_category(
        &self,
        uid: &UserId,
        kind: EntryKind,
    ) -> CoreResult<BTreeMap<String, Amount>> {
        Ok(category_totals(&self.store.list_entries(uid, kind)?))
    }

    /// Expenses and income of the user tagged by kind, newest date first.
    pub fn all_transactions(&self, uid: &UserId) -> CoreResult<Vec<Transaction>> {
        let mut transactions = Vec::new();
        for kind in EntryKind::ALL {
            transactions.extend(
                self.store
                    .list_entries(uid, kind)?
                    .into_iter()
                    .map(|entry| Transaction::new(kind, entry)),
            );
        }
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Transactions dated inside `range`, both ends included.
    pub fn transactions_in_range(
        &self,
        uid: &UserId,
        range: DateRange,
    ) -> CoreResult<Vec<Transaction>> {
        let mut transactions = self.all_transactions(uid)?;
        transactions.retain(|txn| range.contains(txn.entry.date));
        Ok(transactions)
    }

    /// Income, expenses and net result for the transactions inside `range`.
    pub fn period_totals(&self, uid: &UserId, range: DateRange) -> CoreResult<PeriodTotals> {
        let mut totals = PeriodTotals::default();
        for txn in self.transactions_in_range(uid, range)? {
            totals.record(txn.kind, txn.entry.amount);
        }
        Ok(totals)
    }
}

pub fn category_totals(entries: &[Entry]) -> BTreeMap<String, Amount> {
    let mut totals: BTreeMap<String, Amount> = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.category.clone()).or_default() += entry.amount;
    }
    totals
}

/// Orders by date descending; same-day entries put the most recently created first.
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|txn| {
        (
            Reverse(txn.entry.date),
            Reverse(txn.entry.timestamp),
            Reverse(txn.entry.id),
        )
    });
}
