use fintrack_core::CoreError;
use fintrack_domain::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i64, supported: i64 },

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Running balance of {0} would overflow")]
    BalanceOverflow(UserId),

    #[error("Connection lock poisoned")]
    Poisoned,
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnknownUser(uid) => CoreError::UnknownUser(uid),
            StorageError::BalanceOverflow(uid) => CoreError::balance_overflow(&uid),
            StorageError::Io(io) => CoreError::Io(io),
            other => CoreError::Storage(other.to_string()),
        }
    }
}
