use anyhow::{Context, Result, bail};
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
///
/// Every field has a default, so a file only needs to name what it changes.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub session: SessionSettings,
    pub repl: ReplSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// Seed the variable store with the process environment.
    pub inherit_env: bool,
    /// Initial working directory; the process directory when unset.
    pub start_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReplSettings {
    pub prompt: String,
    pub history_file: Option<PathBuf>,
}

impl Default for ReplSettings {
    fn default() -> Self {
        Self {
            prompt: "$ ".to_string(),
            history_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
    /// Append log records to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl LogSettings {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        match self.level.parse() {
            Ok(level) => Ok(level),
            Err(_) => bail!("unknown log level: {}", self.level),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config = toml::from_str(text)?;
        Ok(config)
    }

    /// Load configuration with resolution order:
    /// 1. `path`, when given: it must exist and parse.
    /// 2. `~/.config/pipeshell/config.toml`, if present. A broken file there
    ///    is reported and skipped.
    /// 3. Built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("can't read config {}", path.display()))?;
            return Self::from_toml(&text)
                .with_context(|| format!("can't parse config {}", path.display()));
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Ok(Self::default());
        };
        match Self::from_toml(&text) {
            Ok(config) => Ok(config),
            Err(e) => {
                eprintln!("pipeshell: config parse error in {}: {e:#}", path.display());
                Ok(Self::default())
            }
        }
    }

    fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".config/pipeshell/config.toml"))
    }
}
