//! # Core Module
//!
//! The scene-change detection engine and the fleet check around it.
//!
//! ## Modules
//! - `decode` - Turns encoded snapshots into images
//! - `normalize` - Luma conversion and bounding-box rescaling
//! - `features` - SIFT keypoints and descriptors
//! - `matcher` - Nearest-neighbour search and ratio test
//! - `comparator` - Stable / suspect decision
//! - `reporter` - Diagnostic images and notifications
//! - `fleet` - Snapshot store and per-camera orchestration
//! - `config` - Configuration file

pub mod comparator;
pub mod config;
pub mod decode;
pub mod features;
pub mod fleet;
pub mod matcher;
pub mod normalize;
pub mod reporter;

// Re-export commonly used types
pub use comparator::{ComparatorConfig, MatchResult, SceneComparator, SceneVerdict, SuspectReason};
pub use fleet::{CameraId, FleetChecker, FleetReport};
