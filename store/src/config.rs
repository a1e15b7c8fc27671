//! Configuration for a hwgrid data directory.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! storage:
//!   bundles_dir: data/bundles
//!   cache_dir: data/cache
//! tests_dir: fedora-laptop-testing/tests
//! parse:
//!   jobs: 4
//!   always_regenerate: false
//! ```
//!
//! Relative paths are interpreted relative to the directory holding the
//! configuration file once [`GridConfig::anchor_paths`] has been applied.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Where bundles and cached reports live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded archives and their index.
    pub bundles_dir: PathBuf,
    /// Directory holding one cached report per bundle.
    pub cache_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bundles_dir: PathBuf::from("data/bundles"),
            cache_dir: PathBuf::from("data/cache"),
        }
    }
}

/// Settings controlling report generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Number of bundles regenerated in parallel.
    pub jobs: usize,
    /// Ignore cached reports and always re-parse.
    pub always_regenerate: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            always_regenerate: false,
        }
    }
}

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use hwgrid_store::GridConfig;
///
/// let config: GridConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
/// assert_eq!(config.parse.jobs, 4);
/// assert!(config.tests_dir.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Test suite source tree used to look up test documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests_dir: Option<PathBuf>,
    #[serde(default)]
    pub parse: ParseConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            tests_dir: None,
            parse: ParseConfig::default(),
        }
    }
}

impl GridConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](StoreError::Io) if the file cannot be read,
    /// [`Yaml`](StoreError::Yaml) if parsing fails, or
    /// [`InvalidConfig`](StoreError::InvalidConfig) if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](StoreError::Io) if the file cannot be written, or
    /// [`Yaml`](StoreError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.parse.jobs == 0 {
            return Err(StoreError::InvalidConfig(
                "parse.jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves relative paths against `base`.
    pub fn anchor_paths(&mut self, base: &Path) {
        let anchor = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        anchor(&mut self.storage.bundles_dir);
        anchor(&mut self.storage.cache_dir);
        if let Some(tests_dir) = self.tests_dir.as_mut() {
            anchor(tests_dir);
        }
    }
}
