use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use crate::{Config, ConfigError};

const CONFIG_FILE: &str = "config.json";

/// Loads and stores [`Config`] as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Manager for `<base>/config.json`, creating `base` when needed.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base).map_err(ConfigError::io(&base))?;
        Ok(Self::new(base.join(CONFIG_FILE)))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reads the file; a file that does not exist yet yields defaults.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let data = match fs::read_to_string(&self.config_path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Config::default()),
            Err(err) => return Err(ConfigError::io(&self.config_path)(err)),
        };
        serde_json::from_str(&data).map_err(ConfigError::malformed(&self.config_path))
    }

    /// Writes a staging file next to the config and renames it into place, so
    /// readers see either the old or the new settings.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(ConfigError::malformed(&self.config_path))?;
        let staging = staging_path(&self.config_path);
        write_synced(&staging, json.as_bytes()).map_err(ConfigError::io(&staging))?;
        fs::rename(&staging, &self.config_path).map_err(ConfigError::io(&self.config_path))
    }
}

/// Hidden sibling of `path`: `dir/config.json` stages as `dir/.config.json.partial`.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| CONFIG_FILE.to_string());
    path.with_file_name(format!(".{name}.partial"))
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
