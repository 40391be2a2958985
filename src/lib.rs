//! # Camera Scene Check
//!
//! Flags networked cameras whose view no longer matches a stored reference
//! snapshot: the camera was bumped, blocked, or stopped working.
//!
//! ## Core Philosophy
//! - **A verdict, not a guess** - SIFT features must match, or the camera is suspect
//! - **Show WHY** - every comparison can draw its matches side by side
//! - **Broken input is not a changed scene** - decode failures are errors, never verdicts
//!
//! ## Architecture
//! - `core` - Comparison engine and fleet orchestration
//! - `events` - Progress reporting over channels
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)
//!
//! ## Example
//! ```rust,ignore
//! use camera_scene_check::core::comparator::{ComparatorConfig, SceneComparator};
//!
//! let comparator = SceneComparator::new(ComparatorConfig::new().match_ratio(0.6));
//! let result = comparator.compare_encoded(&reference_jpeg, &test_jpeg)?;
//! println!("{} with {} good matches", result.verdict, result.good_matches);
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, SceneCheckError};

use error::ConfigError;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for the application.
///
/// `RUST_LOG` wins when set. Otherwise logs at `debug` when `debug` is true
/// and at `warn` when it is not. With `log_file`, output is appended to
/// that file instead of stderr.
pub fn init_tracing(debug: bool, log_file: Option<&Path>) -> std::result::Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));

    let installed = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::Logging(format!("{}: {}", path.display(), e)))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| ConfigError::Logging(e.to_string()))
}
