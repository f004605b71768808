//! Layered application configuration.
//!
//! Defaults are overlaid by `config.json` in the user config directory and then
//! by `TALEWEAVER_*` environment variables (`TALEWEAVER_TIMINGS__FLIP_MS=500`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::motion::Timings;

/// Directory under the platform config dir holding our files.
pub const APP_DIR: &str = "taleweaver";
const CONFIG_FILE: &str = "config.json";
const ENV_PREFIX: &str = "TALEWEAVER";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding `front/` and the static images; generated faces when unset.
    pub asset_root: Option<PathBuf>,
    /// Fixed RNG seed for reproducible deals.
    pub seed: Option<u64>,
    /// Phase durations.
    pub timings: Timings,
}

impl AppConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path()?)
    }

    /// Load from an explicit file, which may be absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load from `path`, overlaying `env` instead of the process environment when given.
    ///
    /// Keys in `env` carry the full variable name, e.g. `TALEWEAVER_SEED`.
    pub fn load_with_env(path: &Path, env: Option<Map<String, String>>) -> Result<Self> {
        let defaults = serde_json::to_string(&AppConfig::default())
            .context("failed to serialize default configuration")?;
        let settings = Config::builder()
            .add_source(File::from_str(&defaults, FileFormat::Json))
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Json).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }
}

/// Location of `config.json` in the platform config directory.
pub fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("no platform configuration directory")?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Write a default configuration file at `path` if none exists yet.
pub fn ensure_config_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default configuration")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write configuration {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(true)
}

/// [`ensure_config_file`] at the default location.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path()?;
    ensure_config_file(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn load_isolated(path: &Path) -> Result<AppConfig> {
        AppConfig::load_with_env(path, Some(Map::new()))
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let temp = tempdir()?;
        let config = load_isolated(&temp.path().join("absent.json"))?;
        assert_eq!(config.timings, Timings::default());
        assert_eq!(config.asset_root, None);
        Ok(())
    }

    #[test]
    fn written_defaults_round_trip_and_partial_files_merge() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join(APP_DIR).join(CONFIG_FILE);
        assert!(ensure_config_file(&path)?);
        assert!(!ensure_config_file(&path)?);
        assert_eq!(load_isolated(&path)?, AppConfig::default());

        fs::write(
            &path,
            r#"{ "seed": 9, "asset_root": "/srv/cards", "timings": { "flip_ms": 400 } }"#,
        )?;
        let config = load_isolated(&path)?;
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.asset_root, Some(PathBuf::from("/srv/cards")));
        assert_eq!(config.timings.flip_ms, 400);
        assert_eq!(config.timings.loading_ms, 1000);
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "seed": 9, "timings": { "flip_ms": 400 } }"#)?;

        let env = Map::from([
            ("TALEWEAVER_TIMINGS__FLIP_MS".to_string(), "450".to_string()),
            ("TALEWEAVER_SEED".to_string(), "77".to_string()),
            ("UNRELATED_SEED".to_string(), "1".to_string()),
        ]);
        let config = AppConfig::load_with_env(&path, Some(env))?;
        assert_eq!(config.seed, Some(77));
        assert_eq!(config.timings.flip_ms, 450);
        assert_eq!(config.timings.shuffle_ms, 1000);
        Ok(())
    }
}
