//! Configuration parsing and management.

use crate::storage_key::KeyEncoding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Main configuration struct matching the kbdelta.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Baseline document: a file path or an http(s) URL
    pub document: String,

    /// Timeout for fetching a remote document
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub export: ExportConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    None,
    Memory,
    File,
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,

    /// Blob file for `kind: file`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Database root URL for `kind: rest`
    #[serde(default)]
    pub url: Option<String>,

    /// Node under the database root holding the blob
    #[serde(default = "default_node")]
    pub node: String,

    /// Opaque token forwarded as the `auth` query parameter
    #[serde(default)]
    pub auth: Option<String>,

    #[serde(default)]
    pub key_encoding: KeyEncoding,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_node() -> String {
    String::from("knowledgeBaseChanges")
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: None,
            url: None,
            node: default_node(),
            auth: None,
            key_encoding: KeyEncoding::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_file")]
    pub file: PathBuf,

    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_export_file() -> PathBuf {
    PathBuf::from("knowledgeBase_changes.json")
}

fn default_true() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file: default_export_file(),
            pretty: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from YAML text; relative paths resolve against the cwd
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        if config.document.trim().is_empty() {
            return Err(ConfigError::MissingField("document".into()));
        }
        match config.store.kind {
            StoreKind::File if config.store.path.is_none() => {
                Err(ConfigError::MissingField("store.path".into()))
            }
            StoreKind::Rest if config.store.url.is_none() => {
                Err(ConfigError::MissingField("store.url".into()))
            }
            _ => Ok(config),
        }
    }

    /// True when `document` names a remote resource
    pub fn document_is_remote(&self) -> bool {
        self.document.starts_with("http://") || self.document.starts_with("https://")
    }

    /// Local document path, resolved relative to the config file
    pub fn document_path(&self) -> PathBuf {
        self.resolve_path(Path::new(&self.document))
    }

    /// Blob file for a file store, resolved relative to the config file
    pub fn store_path(&self) -> Option<PathBuf> {
        self.store.path.as_ref().map(|p| self.resolve_path(p))
    }

    /// Default export destination, resolved relative to the config file
    pub fn export_path(&self) -> PathBuf {
        self.resolve_path(&self.export.file)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}
