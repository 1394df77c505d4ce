use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Failures reading or writing the settings file. Each carries the path involved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config at {} is not valid JSON: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ConfigError::Io { path, source }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>) -> impl FnOnce(serde_json::Error) -> Self {
        let path = path.into();
        move |err| ConfigError::Malformed {
            path,
            message: err.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Io { path, .. } | ConfigError::Malformed { path, .. } => path,
        }
    }
}
