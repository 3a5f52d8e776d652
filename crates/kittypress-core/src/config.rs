//! Configuration module for KittyPress.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::naming::FORBIDDEN_CHARS;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for KittyPress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub staging: StagingConfig,
    pub archive: ArchiveConfig,
    pub destination: DestinationConfig,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Local working-area settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Directory holding staging areas, produced archives and extraction output.
    pub cache_dir: PathBuf,
}

/// Archive naming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Extension (without the dot) appended to every produced archive.
    pub extension: String,
    /// MIME type used when creating files in a destination folder.
    pub mime_type: String,
}

/// Destination resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Authority whose `primary:` identifiers allow structural parent inference.
    pub primary_authority: String,
}

/// Scoped storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local directory exposed as the `primary` volume.
    pub root: PathBuf,
    /// Directory for the pending-save record and folder grants.
    pub state_dir: PathBuf,
}

/// Compression engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Archiver program invoked as `<program> compress|decompress ...`.
    pub program: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    ///
    /// Sections missing from the file keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/kittypress/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("kittypress")
            .join("config.yaml")
    }

    /// Expands a leading `~` in a configured path to the home directory.
    pub fn expand_path(path: &Path) -> PathBuf {
        let Ok(rest) = path.strip_prefix("~") else {
            return path.to_path_buf();
        };
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("~/.cache"))
                .join("kittypress"),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            extension: "kitty".to_string(),
            mime_type: "application/octet-stream".to_string(),
        }
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            primary_authority: "externalstorage".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir().unwrap_or_else(|| PathBuf::from("~")),
            state_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("kittypress"),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "kittypress-engine".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"archive.extension"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- staging ---
        if self.staging.cache_dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "staging.cache_dir".into(),
                message: "must not be empty".into(),
            });
        }

        // --- archive ---
        let ext = &self.archive.extension;
        if ext.is_empty() {
            errors.push(ValidationError {
                field: "archive.extension".into(),
                message: "must not be empty".into(),
            });
        } else if ext.contains('.') || ext.chars().any(|c| FORBIDDEN_CHARS.contains(&c)) {
            errors.push(ValidationError {
                field: "archive.extension".into(),
                message: format!("'{ext}' must not contain '.' or path separators"),
            });
        }
        if !self.archive.mime_type.contains('/') {
            errors.push(ValidationError {
                field: "archive.mime_type".into(),
                message: format!(
                    "invalid MIME type '{}'; expected <type>/<subtype>",
                    self.archive.mime_type
                ),
            });
        }

        // --- destination ---
        if self.destination.primary_authority.trim().is_empty() {
            errors.push(ValidationError {
                field: "destination.primary_authority".into(),
                message: "must not be empty".into(),
            });
        }

        // --- storage ---
        // Check the root only when it does not start with `~` (tilde is expanded at runtime).
        let root_str = self.storage.root.to_string_lossy();
        if !root_str.starts_with('~') && !self.storage.root.is_dir() {
            errors.push(ValidationError {
                field: "storage.root".into(),
                message: format!("directory does not exist: {}", self.storage.root.display()),
            });
        }
        if self.storage.state_dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.state_dir".into(),
                message: "must not be empty".into(),
            });
        }

        // --- engine ---
        if self.engine.program.trim().is_empty() {
            errors.push(ValidationError {
                field: "engine.program".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use kittypress_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .staging_cache_dir(PathBuf::from("/tmp/kittypress"))
///     .archive_extension("kitty")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pre-populated with default values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- staging ---

    pub fn staging_cache_dir(mut self, dir: PathBuf) -> Self {
        self.config.staging.cache_dir = dir;
        self
    }

    // --- archive ---

    pub fn archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.archive.extension = extension.into();
        self
    }

    pub fn archive_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.config.archive.mime_type = mime_type.into();
        self
    }

    // --- destination ---

    pub fn destination_primary_authority(mut self, authority: impl Into<String>) -> Self {
        self.config.destination.primary_authority = authority.into();
        self
    }

    // --- storage ---

    pub fn storage_root(mut self, root: PathBuf) -> Self {
        self.config.storage.root = root;
        self
    }

    pub fn storage_state_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.state_dir = dir;
        self
    }

    // --- engine ---

    pub fn engine_program(mut self, program: impl Into<String>) -> Self {
        self.config.engine.program = program.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
