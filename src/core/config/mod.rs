//! # Config Module
//!
//! JSON configuration for scheduled fleet checks.
//!
//! ## Lookup
//! 1. `--config <path>` when given (must exist)
//! 2. `<config dir>/camera-scene-check/config.json` when present
//! 3. Built-in defaults
//!
//! Command-line flags override whatever the file says.

use crate::core::comparator::ComparatorConfig;
use crate::core::fleet::DirectoryStore;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "camera-scene-check";
const CONFIG_FILE: &str = "config.json";

/// Run behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Debug-level logging
    pub debugging: bool,
    /// Ratio-test threshold
    pub sift_ratio: f32,
    /// Minimum good matches for a stable scene
    pub sift_matches: usize,
    /// Per-camera time limit in seconds
    pub timeout_secs: u64,
    /// Check cameras in parallel
    pub parallel: bool,
    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debugging: false,
            sift_ratio: 0.6,
            sift_matches: 10,
            timeout_secs: 60,
            parallel: true,
            log_file: None,
        }
    }
}

/// Snapshot directory layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub reference_dir: PathBuf,
    pub test_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            reference_dir: PathBuf::from("referenceImages"),
            test_dir: PathBuf::from("testImages"),
        }
    }
}

/// Notification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// First words of every suspect message
    pub message_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            message_prefix: "Camera scene check".to_string(),
        }
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub general: GeneralConfig,
    pub storage: StorageConfig,
    pub report: ReportConfig,
}

impl MonitorConfig {
    /// Platform default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and built-in defaults are used if nothing is there.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Read and validate one config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.general.sift_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::Invalid {
                field: "general.sift_ratio",
                reason: format!("must be strictly between 0 and 1, got {}", ratio),
            });
        }
        if self.general.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "general.timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Comparator settings described by this file
    pub fn comparator_config(&self) -> ComparatorConfig {
        ComparatorConfig::new()
            .match_ratio(self.general.sift_ratio)
            .min_good_matches(self.general.sift_matches)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.general.timeout_secs)
    }

    /// Snapshot store described by this file
    pub fn store(&self) -> DirectoryStore {
        DirectoryStore::with_dirs(
            &self.storage.root,
            &self.storage.reference_dir,
            &self.storage.test_dir,
        )
    }
}
