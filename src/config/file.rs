//! Optional TOML configuration file.
//!
//! Every key is optional and mirrors a command-line flag. Flags win over
//! the file, the file wins over built-in defaults.
//!
//! ```toml
//! sample_size = 500
//! include_namespace = ["shop.*"]
//! max_collection_count = 50
//!
//! [bounds]
//! max_string_length = 32
//! start_date = "2020-01-01T00:00:00+00:00"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub sample_size: Option<u32>,
    pub include_namespace: Option<Vec<String>>,
    pub exclude_namespace: Option<Vec<String>>,
    pub max_collection_count: Option<usize>,
    pub accumulate_wildcards: Option<bool>,
    pub concurrency: Option<usize>,
    pub output: Option<PathBuf>,
    pub bounds: FileBounds,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileBounds {
    pub min_int: Option<i64>,
    pub max_int: Option<i64>,
    pub min_string_length: Option<u32>,
    pub max_string_length: Option<u32>,
    pub min_array_length: Option<u32>,
    pub max_array_length: Option<u32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub bare: Option<bool>,
}

impl FileConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config file {}", path.display());
        Self::from_toml(&content)
    }
}
