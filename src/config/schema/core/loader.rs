use super::Config;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads `config.toml` from a fixed path on every call.
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    path: PathBuf,
}

impl FileConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.mux/config.toml`
    pub fn default_location() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Ok(Self::new(home.join(".mux").join("config.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Config {
    /// Load and validate the config at `path`. A missing file yields the
    /// defaults (with env overrides applied).
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<Config>(&contents)
                .map_err(|error| ConfigError::Load(error.to_string()))
                .context("Failed to parse config file")?,
            Err(error) if error.kind() == ErrorKind::NotFound => Self::default(),
            Err(error) => {
                return Err(ConfigError::Io(error)).context("Failed to read config file");
            }
        };
        config.config_path = path.to_path_buf();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load_from`], but never fails: problems are logged and
    /// the defaults are used instead.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %format!("{error:#}"), "config.load_failed");
                let mut config = Self {
                    config_path: path.to_path_buf(),
                    ..Self::default()
                };
                config.apply_env_overrides();
                config
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
