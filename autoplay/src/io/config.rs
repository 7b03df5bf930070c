//! Automation configuration stored as `auto_player_config.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::core::config::{AutoPlayConfig, Strategy, ValidationError, validate};

pub const CONFIG_FILE_NAME: &str = "auto_player_config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("write config {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    /// Field named by a validation failure, if that is what this is.
    pub fn invalid_field(&self) -> Option<&'static str> {
        match self {
            ConfigError::Validation(err) => Some(err.field),
            _ => None,
        }
    }
}

/// Persisted form (JSON, camelCase).
///
/// This file is intended to be edited by humans. Unknown fields are ignored and
/// missing fields take default values; `strategy` stays a string here so an
/// unknown value is reported as a validation failure rather than a parse error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    enabled: bool,
    auto_discard: bool,
    auto_meld: bool,
    auto_riichi: bool,
    auto_agari: bool,
    min_confidence: f64,
    defense_threshold: f64,
    delay_seconds: f64,
    confirm_actions: bool,
    strategy: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::from(&AutoPlayConfig::default())
    }
}

impl From<&AutoPlayConfig> for ConfigFile {
    fn from(config: &AutoPlayConfig) -> Self {
        Self {
            enabled: config.enabled,
            auto_discard: config.auto_discard,
            auto_meld: config.auto_meld,
            auto_riichi: config.auto_riichi,
            auto_agari: config.auto_agari,
            min_confidence: config.min_confidence,
            defense_threshold: config.defense_threshold,
            delay_seconds: config.delay_seconds,
            confirm_actions: config.confirm_actions,
            strategy: config.strategy.as_str().to_string(),
        }
    }
}

impl TryFrom<ConfigFile> for AutoPlayConfig {
    type Error = ValidationError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let config = AutoPlayConfig {
            enabled: file.enabled,
            auto_discard: file.auto_discard,
            auto_meld: file.auto_meld,
            auto_riichi: file.auto_riichi,
            auto_agari: file.auto_agari,
            min_confidence: file.min_confidence,
            defense_threshold: file.defense_threshold,
            delay_seconds: file.delay_seconds,
            confirm_actions: file.confirm_actions,
            strategy: Strategy::Balanced,
        };
        validate(&config)?;
        let strategy: Strategy = file.strategy.parse()?;
        Ok(AutoPlayConfig { strategy, ..config })
    }
}

/// Read and validate a config file. Does not touch any active configuration.
pub fn read_config_file(path: &Path) -> Result<AutoPlayConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile =
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(AutoPlayConfig::try_from(file)?)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config_file(path: &Path, config: &AutoPlayConfig) -> Result<(), ConfigError> {
    validate(config)?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut buf = serde_json::to_string_pretty(&ConfigFile::from(config))
        .map_err(|err| write_err(io::Error::other(err)))?;
    buf.push('\n');
    write_atomic(path, &buf).map_err(write_err)
}

fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}

/// Owner of the active configuration and its file.
///
/// Reads and writes of the active value are serialized through an `RwLock`;
/// the decision path only ever reads a snapshot via [`ConfigStore::get`].
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    active: RwLock<AutoPlayConfig>,
}

impl ConfigStore {
    /// Store backed by `path`. The active value is the default until [`ConfigStore::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: RwLock::new(AutoPlayConfig::default()),
        }
    }

    /// Store backed by [`CONFIG_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted config and activate it.
    ///
    /// A missing file is replaced by the default, which is written out and
    /// activated. An invalid file is rejected and leaves the active value untouched.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<AutoPlayConfig, ConfigError> {
        if !self.path.exists() {
            info!("config missing, writing default");
            return self.reset();
        }
        let config = read_config_file(&self.path)?;
        debug!(enabled = config.enabled, strategy = %config.strategy, "config loaded");
        self.activate(config.clone());
        Ok(config)
    }

    /// Persist the active configuration.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn save(&self) -> Result<(), ConfigError> {
        let config = self.get();
        write_config_file(&self.path, &config)?;
        debug!("config saved");
        Ok(())
    }

    pub fn get(&self) -> AutoPlayConfig {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the active configuration after validating it. Not persisted.
    pub fn set(&self, config: AutoPlayConfig) -> Result<(), ConfigError> {
        validate(&config)?;
        self.activate(config);
        Ok(())
    }

    /// Apply an edit to a copy of the active config, validate, then activate it.
    pub fn update<F>(&self, edit: F) -> Result<AutoPlayConfig, ConfigError>
    where
        F: FnOnce(&mut AutoPlayConfig),
    {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = guard.clone();
        edit(&mut candidate);
        validate(&candidate)?;
        *guard = candidate.clone();
        Ok(candidate)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled = enabled;
        info!(enabled, "automation switched");
    }

    /// Flip `enabled` and return the new value.
    pub fn toggle_enabled(&self) -> bool {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        guard.enabled = !guard.enabled;
        info!(enabled = guard.enabled, "automation switched");
        guard.enabled
    }

    pub fn set_strategy(&self, strategy: Strategy) {
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .strategy = strategy;
        info!(%strategy, "strategy switched");
    }

    /// Persist and activate the default configuration.
    pub fn reset(&self) -> Result<AutoPlayConfig, ConfigError> {
        let config = AutoPlayConfig::default();
        write_config_file(&self.path, &config)?;
        self.activate(config.clone());
        Ok(config)
    }

    fn activate(&self, config: AutoPlayConfig) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

/// Multi-line rendering for `auto-show` / `config show`.
pub fn render_config(config: &AutoPlayConfig) -> String {
    format!(
        "automation config:\n  \
         enabled:           {}\n  \
         auto discard:      {}\n  \
         auto meld:         {}\n  \
         auto riichi:       {}\n  \
         auto agari:        {}\n  \
         min confidence:    {:.2}\n  \
         defense threshold: {:.2}\n  \
         delay:             {:.1}s\n  \
         confirm actions:   {}\n  \
         strategy:          {}",
        config.enabled,
        config.auto_discard,
        config.auto_meld,
        config.auto_riichi,
        config.auto_agari,
        config.min_confidence,
        config.defense_threshold,
        config.delay_seconds,
        config.confirm_actions,
        config.strategy,
    )
}
