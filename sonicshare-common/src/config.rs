//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from an optional TOML file. Every field has a
//! built-in default, so a missing file degrades to defaults with a warning
//! rather than stopping startup.
//!
//! # Root folder priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `SONICSHARE_ROOT_FOLDER` environment variable
//! 3. `SONICSHARE_ROOT` environment variable
//! 4. TOML `root_folder`
//! 5. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Primary root folder environment variable
pub const ENV_ROOT_FOLDER: &str = "SONICSHARE_ROOT_FOLDER";
/// Alternative root folder environment variable
pub const ENV_ROOT: &str = "SONICSHARE_ROOT";

/// Canonical column list of the current archive schema.
///
/// Mirrored by the archive crate's schema definition; kept here so the
/// `clean_columns` default does not depend on the archive crate.
pub const DEFAULT_CLEAN_COLUMNS: [&str; 6] = [
    "filename",
    "tags",
    "prompt",
    "custom_notes",
    "license",
    "timestamp",
];

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Root folder holding the archive (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Archive file settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Text classification service settings
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Archive file settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// Archive path, relative to the root folder unless absolute
    #[serde(default = "default_archive_path")]
    pub path: PathBuf,

    /// Columns kept by `clean` (projection target)
    #[serde(default = "default_clean_columns")]
    pub clean_columns: Vec<String>,

    /// Suggested file name for exported copies
    #[serde(default = "default_export_name")]
    pub export_name: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: default_archive_path(),
            clean_columns: default_clean_columns(),
            export_name: default_export_name(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Zero-shot classification service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Base URL of the inference endpoint
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,

    /// Model identifier appended to the endpoint
    #[serde(default = "default_classifier_model")]
    pub model: String,

    /// Name of the environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_classifier_endpoint(),
            model: default_classifier_model(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("logs").join("data.csv")
}

fn default_clean_columns() -> Vec<String> {
    DEFAULT_CLEAN_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_export_name() -> String {
    "sonicshare_archive.csv".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_classifier_endpoint() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_classifier_model() -> String {
    "facebook/bart-large-mnli".to_string()
}

fn default_token_env() -> String {
    "HF_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Built-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
        }
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/sonicshare
        dirs::data_local_dir()
            .map(|d| d.join("sonicshare"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/sonicshare"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/sonicshare
        dirs::data_dir()
            .map(|d| d.join("sonicshare"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/sonicshare"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\sonicshare
        dirs::data_local_dir()
            .map(|d| d.join("sonicshare"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\sonicshare"))
    } else {
        PathBuf::from("./sonicshare_data")
    }
}

/// Default configuration file path, if one exists on this machine
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("sonicshare").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/sonicshare/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Configuration together with the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    /// `None` when no file was found and built-in defaults apply
    pub source: Option<PathBuf>,
}

/// Load bootstrap configuration
///
/// An explicit path must exist and parse. Without one, the platform default
/// location is tried; if nothing is found, built-in defaults are used. Nothing
/// is logged here since logging is configured from the result.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let source = match explicit {
        Some(path) if !path.exists() => {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let config = match &source {
        Some(path) => read_toml_config(path)?,
        None => TomlConfig::default(),
    };
    Ok(LoadedConfig { config, source })
}

/// Resolves the root folder from CLI, environment, TOML, and defaults
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root folder given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Root folder from the TOML config
    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in [ENV_ROOT_FOLDER, ENV_ROOT] {
            if let Ok(path) = std::env::var(var) {
                if !path.is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Resolve the archive file location under a root folder
pub fn archive_path(root_folder: &Path, archive: &ArchiveConfig) -> PathBuf {
    if archive.path.is_absolute() {
        archive.path.clone()
    } else {
        root_folder.join(&archive.path)
    }
}
