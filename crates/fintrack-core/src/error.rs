use fintrack_domain::{DateRangeError, UserId};
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// A write that would push the user's running balance outside the `i64` range.
    pub fn balance_overflow(uid: &UserId) -> Self {
        CoreError::Validation(format!("running balance of {uid} would overflow"))
    }
}

impl From<DateRangeError> for CoreError {
    fn from(err: DateRangeError) -> Self {
        CoreError::Validation(err.to_string())
    }
}
