//! # Error Module
//!
//! Error types for the camera scene checker.
//!
//! ## Design Principles
//! - **Never panic** on camera data - return errors instead
//! - **Include context** - camera ids, paths, which image failed
//! - **Verdicts are not errors** - a featureless or changed scene is a
//!   `Suspect` verdict, only unusable input ends up here

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum SceneCheckError {
    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Which side of a comparison an image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImageRole {
    Reference,
    Candidate,
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageRole::Reference => write!(f, "reference"),
            ImageRole::Candidate => write!(f, "candidate"),
        }
    }
}

/// Errors that stop a single scene comparison
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Failed to decode {role} image: {source}")]
    Decode {
        role: ImageRole,
        #[source]
        source: DecodeError,
    },

    #[error("Failed to normalize {role} image: {reason}")]
    Normalize { role: ImageRole, reason: String },

    #[error("Invalid comparator configuration: {0}")]
    InvalidConfig(String),
}

impl CompareError {
    /// True when the input image itself was unusable
    pub fn is_decode(&self) -> bool {
        matches!(self, CompareError::Decode { .. })
    }
}

/// Reasons an encoded snapshot could not be turned into pixels
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("input is empty")]
    Empty,

    #[error("malformed image data: {0}")]
    Malformed(String),

    #[error("decoded image has no pixels ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },
}

/// Errors while drawing the diagnostic match visualization
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Diagnostic canvas {width}x{height} exceeds the {limit} pixel limit")]
    CanvasTooLarge { width: u32, height: u32, limit: u64 },

    #[error("Keypoint index {index} out of range ({len} keypoints)")]
    KeypointOutOfRange { index: usize, len: usize },
}

/// Errors from the snapshot store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid camera id {id:?}: only letters, digits, '.', '_' and '-' are allowed")]
    InvalidCameraId { id: String },

    #[error("No test snapshot on file for camera {camera}")]
    MissingSnapshot { camera: String },

    #[error("Snapshot directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write diagnostic image {path}: {reason}")]
    DiagnosticWrite { path: PathBuf, reason: String },
}

/// Errors while delivering the suspect report
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),
}

/// Errors while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SceneCheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_image_role() {
        let error = CompareError::Decode {
            role: ImageRole::Reference,
            source: DecodeError::Empty,
        };
        let message = error.to_string();
        assert!(message.contains("reference"));
        assert!(message.contains("empty"));
        assert!(error.is_decode());
    }

    #[test]
    fn store_error_includes_camera() {
        let error = StoreError::MissingSnapshot {
            camera: "Q2GV-ABCD-1234".to_string(),
        };
        assert!(error.to_string().contains("Q2GV-ABCD-1234"));
    }

    #[test]
    fn config_error_includes_field() {
        let error = ConfigError::Invalid {
            field: "general.sift_ratio",
            reason: "must be between 0 and 1".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("general.sift_ratio"));
    }

    #[test]
    fn compare_error_converts_to_top_level() {
        let error: SceneCheckError = CompareError::InvalidConfig("ratio".to_string()).into();
        assert!(matches!(error, SceneCheckError::Compare(_)));
    }
}
