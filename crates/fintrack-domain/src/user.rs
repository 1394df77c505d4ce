//! Locally known users and their running balance.

use serde::{Deserialize, Serialize};

use crate::common::{Amount, UserId};

/// A user as seen by the local ledger.
///
/// `total` is derived: it is the sum of income minus the sum of expenses and is
/// kept up to date by every ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: UserId,
    pub name: String,
    pub total: Amount,
}

impl User {
    pub fn new(uid: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            total: Amount::ZERO,
        }
    }
}
