use std::{env, path::PathBuf};

use dirs::home_dir;

pub const HOME_ENV: &str = "FINTRACK_HOME";
const DEFAULT_DIR_NAME: &str = ".fintrack";

/// Application directory: `$FINTRACK_HOME`, or `~/.fintrack`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_is_used_verbatim() {
        let custom = env::temp_dir().join("fintrack-home-test");
        env::set_var(HOME_ENV, &custom);
        assert_eq!(app_data_dir(), custom);
        env::remove_var(HOME_ENV);
        assert!(app_data_dir().ends_with(DEFAULT_DIR_NAME));
    }
}
