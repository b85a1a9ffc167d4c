use std::path::{Path, PathBuf};

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "covid-tracker.json";

/// Dataset read at startup when nothing else is configured.
pub const DEFAULT_DATA_PATH: &str = "owid-covid-data.csv";

/// Product default: open on Kenya whenever the dataset has it.
pub const DEFAULT_COUNTRY: &str = "Kenya";

/// User-overridable settings. Every field is optional in the file; anything
/// missing keeps its default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset loaded at startup (a CLI argument overrides it).
    pub data_path: PathBuf,
    /// Country selected when a dataset is first shown, if present in it.
    pub default_country: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            default_country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl AppConfig {
    /// Read [`CONFIG_FILE`] from the working directory. Absent file means
    /// defaults; a malformed file means defaults plus a warning, never a
    /// startup failure.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return AppConfig::default();
        }
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("{}: ignoring malformed config: {e}", path.display());
                    AppConfig::default()
                }
            },
            Err(e) => {
                log::warn!("{}: cannot read config: {e}", path.display());
                AppConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_a_config_file() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("missing.json"));
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.default_country, DEFAULT_COUNTRY);
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "default_country": "Peru" }"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.default_country, "Peru");
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.default_country, DEFAULT_COUNTRY);
    }
}
