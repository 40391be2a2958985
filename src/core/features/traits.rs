//! Trait definitions for local feature extraction.

use super::types::FeatureSet;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Available feature extractors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureExtractorKind {
    /// Difference-of-Gaussian keypoints with gradient-histogram descriptors
    Sift,
}

impl FeatureExtractorKind {
    /// Get a human-readable description of the extractor
    pub fn description(&self) -> &'static str {
        match self {
            FeatureExtractorKind::Sift => {
                "SIFT - scale and rotation invariant keypoints with 128-value descriptors"
            }
        }
    }
}

impl std::fmt::Display for FeatureExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureExtractorKind::Sift => write!(f, "SIFT"),
        }
    }
}

/// Trait for keypoint detector/descriptor implementations
///
/// Implementations must be deterministic: the same image always yields the
/// same features in the same order.
pub trait FeatureExtractor: Send + Sync {
    /// Detect keypoints and compute descriptors on a normalized luma image.
    ///
    /// An empty set is a valid answer for featureless images.
    fn extract(&self, image: &GrayImage) -> FeatureSet;

    /// Get the extractor kind
    fn kind(&self) -> FeatureExtractorKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(FeatureExtractorKind::Sift.to_string(), "SIFT");
        assert!(FeatureExtractorKind::Sift.description().contains("128"));
    }
}
