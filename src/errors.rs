use fintrack_config::ConfigError;
use fintrack_core::CoreError;
use fintrack_storage_sqlite::StorageError;
use thiserror::Error;

pub type FinTrackResult<T> = Result<T, FinTrackError>;

/// Failures surfaced by the [`crate::FinanceApp`] facade.
#[derive(Debug, Error)]
pub enum FinTrackError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
