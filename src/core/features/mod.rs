//! # Features Module
//!
//! Local keypoint detection and description.
//!
//! ## How It Works
//! 1. Build a Gaussian pyramid and its difference-of-Gaussian layers
//! 2. Find scale-space extrema and refine them to subpixel accuracy
//! 3. Drop low-contrast and edge-like responses
//! 4. Assign one or more dominant gradient orientations
//! 5. Describe each keypoint with a rotated 4x4x8 gradient histogram
//!
//! Everything is deterministic: no sampling, no thread-order effects.
//!
//! ## Example
//! ```rust,ignore
//! use camera_scene_check::core::features::{FeatureExtractor, SiftExtractor};
//!
//! let features = SiftExtractor::default().extract(&gray);
//! println!("{} keypoints", features.len());
//! ```

mod descriptor;
mod scale_space;
mod sift;
mod traits;
mod types;

pub use sift::{SiftConfig, SiftExtractor};
pub use traits::{FeatureExtractor, FeatureExtractorKind};
pub use types::{Descriptor, FeatureSet, Keypoint, DESCRIPTOR_LEN};
