use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE_FILE: &str = "fintrack.db";

/// Settings persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Ledger database location. Relative paths resolve against the app home;
    /// `None` means `<home>/fintrack.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_file: Option<PathBuf>,
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    #[serde(default = "Config::default_locale")]
    pub locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_file: None,
            log_filter: Self::default_log_filter(),
            currency: Self::default_currency(),
            locale: Self::default_locale(),
        }
    }
}

impl Config {
    pub fn default_log_filter() -> String {
        "fintrack=info".into()
    }

    pub fn default_currency() -> String {
        "USD".into()
    }

    pub fn default_locale() -> String {
        "en-US".into()
    }

    pub fn resolve_database_file(&self, home: &Path) -> PathBuf {
        match &self.database_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => home.join(path),
            None => home.join(DEFAULT_DATABASE_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_file_resolves_against_home() {
        let home = Path::new("/srv/fintrack");
        let mut config = Config::default();
        assert_eq!(
            config.resolve_database_file(home),
            home.join(DEFAULT_DATABASE_FILE)
        );

        config.database_file = Some(PathBuf::from("data/ledger.db"));
        assert_eq!(
            config.resolve_database_file(home),
            home.join("data/ledger.db")
        );

        let absolute = std::env::temp_dir().join("elsewhere.db");
        config.database_file = Some(absolute.clone());
        assert_eq!(config.resolve_database_file(home), absolute);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"currency":"EUR"}"#).unwrap();
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.log_filter, "fintrack=info");
        assert_eq!(config.locale, "en-US");
        assert!(config.database_file.is_none());
    }
}
