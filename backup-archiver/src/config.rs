//! Configuration management for the backup archiver.
//!
//! Defaults, then an optional TOML file, then environment variables
//! prefixed `BACKUP_ARCHIVER` (sections separated by `__`, e.g.
//! `BACKUP_ARCHIVER_LOG__LEVEL=debug`).

use crate::utils::errors::{BackupError, Result};
use ::config::{Environment, File as ConfigFile, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "BACKUP_ARCHIVER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub walk: WalkConfig,
    pub lock: LockConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Leading literal of every archive name
    pub prefix: String,

    /// Container extension, without the dot
    pub extension: String,

    /// chrono strftime pattern for the creation timestamp
    pub timestamp_format: String,

    /// Compression method for every entry
    pub compression: Compression,

    /// Compression level (method specific; None = library default)
    pub compression_level: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
    Zstd,
}

impl Compression {
    /// Inclusive range of accepted levels, or None if the method takes no level.
    pub fn level_range(self) -> Option<(i64, i64)> {
        match self {
            Compression::Stored => None,
            Compression::Deflated => Some((1, 9)),
            Compression::Zstd => Some((-7, 22)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Follow symbolic links while collecting files
    pub follow_links: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Hold an exclusive lock on the backup root for the whole run
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log output (stderr, stdout)
    pub output: String,
}

// Default values
fn default_prefix() -> String {
    "backup_".to_string()
}

fn default_extension() -> String {
    "zip".to_string()
}

fn default_timestamp_format() -> String {
    "%Y.%m.%d_%H.%M".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            extension: default_extension(),
            timestamp_format: default_timestamp_format(),
            compression: Compression::default(),
            compression_level: None,
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "stderr".to_string(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, optional TOML file, environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = toml::to_string(&Config::default())
            .map_err(|e| BackupError::Config(format!("cannot render defaults: {}", e)))?;

        let mut builder = ::config::Config::builder()
            .add_source(ConfigFile::from_str(&defaults, FileFormat::Toml));

        if let Some(path) = path {
            if !path.is_file() {
                return Err(BackupError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(ConfigFile::from(path).format(FileFormat::Toml));
        }

        let config: Config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file only, without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| BackupError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce unparseable or unsafe archive names.
    pub fn validate(&self) -> Result<()> {
        let archive = &self.archive;

        if archive.prefix.is_empty() {
            return Err(BackupError::Config("archive.prefix must not be empty".into()));
        }
        if archive.extension.is_empty() || archive.extension.contains('.') {
            return Err(BackupError::Config(
                "archive.extension must be non-empty and given without a dot".into(),
            ));
        }
        for value in [&archive.prefix, &archive.extension, &archive.timestamp_format] {
            if value.contains('/') || value.contains('\\') {
                return Err(BackupError::Config(format!(
                    "archive naming must not contain path separators: {:?}",
                    value
                )));
            }
        }

        // The rendered timestamp must never look like a version marker,
        // otherwise the first `_v<digits>` match would come from the date.
        let sample = chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| BackupError::Config("invalid sample date".into()))?;
        let mut rendered = String::new();
        use std::fmt::Write as _;
        write!(rendered, "{}", sample.format(&archive.timestamp_format)).map_err(|_| {
            BackupError::Config(format!(
                "invalid archive.timestamp_format: {:?}",
                archive.timestamp_format
            ))
        })?;
        if crate::archive::naming::contains_version_marker(&format!(
            "{}{}",
            archive.prefix, rendered
        )) {
            return Err(BackupError::Config(
                "archive.prefix and archive.timestamp_format must not contain a `_v<digits>` marker"
                    .into(),
            ));
        }

        match (archive.compression.level_range(), archive.compression_level) {
            (None, Some(level)) => Err(BackupError::Config(format!(
                "compression level {} is not accepted by {:?}",
                level, archive.compression
            ))),
            (Some((min, max)), Some(level)) if level < min || level > max => {
                Err(BackupError::Config(format!(
                    "compression level {} outside {}..={} for {:?}",
                    level, min, max, archive.compression
                )))
            }
            _ => Ok(()),
        }
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| BackupError::Config(format!("cannot render configuration: {}", e)))
    }
}
