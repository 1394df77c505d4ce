//! User bookkeeping: creation, balance lookup and bulk data removal.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use fintrack_domain::{Amount, User, UserId};

use crate::{
    error::CoreResult,
    storage::{LedgerStore, PurgeReport, Reconciliation},
};

/// Result of [`UserService::delete_all_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurgeOutcome {
    /// The user had no entries, no budgets and a zero balance.
    NothingToDo,
    /// Data was removed and the balance reset, atomically.
    Purged(PurgeReport),
}

/// Creates users and maintains their derived balance.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn LedgerStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Inserts a user with a zero balance. Returns `false` if the uid already exists.
    pub fn add(&self, uid: impl Into<UserId>, name: impl Into<String>) -> CoreResult<bool> {
        let user = User::new(uid, name);
        let created = self.store.insert_user(&user)?;
        if created {
            debug!(uid = %user.uid, "user created");
        } else {
            debug!(uid = %user.uid, "user already present");
        }
        Ok(created)
    }

    /// Returns the user, creating it first when this identity is seen for the first time.
    pub fn ensure(&self, uid: impl Into<UserId>, name: impl Into<String>) -> CoreResult<User> {
        let uid = uid.into();
        if let Some(user) = self.store.get_user(&uid)? {
            return Ok(user);
        }
        let user = User::new(uid, name);
        self.store.insert_user(&user)?;
        debug!(uid = %user.uid, "user created on first sight");
        Ok(self.store.get_user(&user.uid)?.unwrap_or(user))
    }

    pub fn get(&self, uid: &UserId) -> CoreResult<Option<User>> {
        self.store.get_user(uid)
    }

    /// Running balance of the user, `None` when the user is unknown.
    pub fn total(&self, uid: &UserId) -> CoreResult<Option<Amount>> {
        Ok(self.store.get_user(uid)?.map(|user| user.total))
    }

    /// Deletes every expense, income record and budget of the user and resets
    /// the balance to zero in a single atomic step.
    pub fn delete_all_data(&self, uid: &UserId) -> CoreResult<PurgeOutcome> {
        let report = self.store.purge_user_data(uid)?;
        if report.is_noop() {
            debug!(uid = %uid, "nothing to purge");
            return Ok(PurgeOutcome::NothingToDo);
        }
        info!(
            uid = %uid,
            expenses = report.expenses,
            income = report.income,
            budgets = report.budgets,
            "user data purged"
        );
        Ok(PurgeOutcome::Purged(report))
    }

    /// Recomputes the balance from the ledger, repairing any drift.
    pub fn reconcile(&self, uid: &UserId) -> CoreResult<Option<Reconciliation>> {
        let outcome = self.store.reconcile_total(uid)?;
        if let Some(result) = outcome.filter(Reconciliation::drifted) {
            warn!(
                uid = %uid,
                stored = result.stored.units(),
                computed = result.computed.units(),
                "balance drift repaired"
            );
        }
        Ok(outcome)
    }
}
