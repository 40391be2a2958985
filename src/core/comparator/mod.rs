//! # Comparator Module
//!
//! Decides whether a camera still sees the same scene as its reference.
//!
//! ## How It Works
//! 1. Note whether both images are pixel-identical (logged, never decisive)
//! 2. Normalize both to luma inside the same bounding box
//! 3. Extract SIFT features from each
//! 4. Match reference features to candidate features with the ratio test
//! 5. Stable if enough matches survive, suspect otherwise
//! 6. Draw the side-by-side diagnostic image (best effort)
//!
//! ## Verdicts
//! | Situation | Verdict |
//! |-----------|---------|
//! | `good_matches >= min_good_matches` | Stable |
//! | `good_matches < min_good_matches` | Suspect (too few matches) |
//! | No features on either side | Suspect (regardless of minimum) |
//!
//! Unusable input is an error, never a verdict.

mod config;
mod identity;

pub use config::ComparatorConfig;
pub use identity::{pixel_difference, PixelDifference};

use crate::core::decode::FastDecoder;
use crate::core::features::{FeatureExtractor, SiftExtractor};
use crate::core::matcher::{match_features, BruteForceMatcher, DescriptorMatcher, RatioTest};
use crate::core::normalize::Normalizer;
use crate::core::reporter::MatchVisualizer;
use crate::error::{CompareError, DecodeError, ImageRole};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Outcome of a scene comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneVerdict {
    /// The candidate still shows the reference scene
    Stable,
    /// The scene changed (moved, obstructed, broken camera)
    Suspect,
}

impl SceneVerdict {
    pub fn is_suspect(&self) -> bool {
        matches!(self, SceneVerdict::Suspect)
    }
}

impl std::fmt::Display for SceneVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneVerdict::Stable => write!(f, "stable"),
            SceneVerdict::Suspect => write!(f, "suspect"),
        }
    }
}

/// Why a comparison ended up suspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspectReason {
    /// The reference image has no usable features
    NoReferenceFeatures,
    /// The candidate image has no usable features
    NoCandidateFeatures,
    /// Fewer good matches than required
    TooFewMatches,
}

impl std::fmt::Display for SuspectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuspectReason::NoReferenceFeatures => write!(f, "no features in reference image"),
            SuspectReason::NoCandidateFeatures => write!(f, "no features in candidate image"),
            SuspectReason::TooFewMatches => write!(f, "too few good matches"),
        }
    }
}

/// Result of comparing a candidate image against its reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub verdict: SceneVerdict,
    /// Correspondences that passed the ratio test
    pub good_matches: usize,
    pub reference_keypoints: usize,
    pub candidate_keypoints: usize,
    /// Both inputs had the same shape and exactly equal samples
    pub pixel_identical: bool,
    /// Set only for suspect verdicts
    pub suspect_reason: Option<SuspectReason>,
    /// Side-by-side match image; `None` if disabled or rendering failed
    #[serde(skip)]
    pub diagnostic: Option<RgbImage>,
}

impl MatchResult {
    pub fn is_suspect(&self) -> bool {
        self.verdict.is_suspect()
    }
}

/// Compares reference and candidate images of one camera.
///
/// Holds no state between calls, so one comparator can serve many threads.
pub struct SceneComparator {
    config: ComparatorConfig,
    extractor: Box<dyn FeatureExtractor>,
    matcher: Box<dyn DescriptorMatcher>,
}

impl SceneComparator {
    /// Create a comparator with the SIFT extractor and brute-force matcher
    pub fn new(config: ComparatorConfig) -> Self {
        Self {
            extractor: Box::new(SiftExtractor::new(config.sift)),
            matcher: Box::new(BruteForceMatcher::new()),
            config,
        }
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Decode two encoded snapshots and compare them
    pub fn compare_encoded(
        &self,
        reference: &[u8],
        candidate: &[u8],
    ) -> Result<MatchResult, CompareError> {
        let reference = FastDecoder::decode(reference).map_err(|source| CompareError::Decode {
            role: ImageRole::Reference,
            source,
        })?;
        let candidate = FastDecoder::decode(candidate).map_err(|source| CompareError::Decode {
            role: ImageRole::Candidate,
            source,
        })?;
        self.compare(&reference, &candidate)
    }

    /// Compare a candidate image against the reference image
    pub fn compare(
        &self,
        reference: &DynamicImage,
        candidate: &DynamicImage,
    ) -> Result<MatchResult, CompareError> {
        self.config.validate()?;
        ensure_pixels(reference, ImageRole::Reference)?;
        ensure_pixels(candidate, ImageRole::Candidate)?;

        let pixel_identical = match pixel_difference(reference, candidate) {
            Some(diff) if diff.is_identical() => {
                tracing::debug!(
                    "reference and candidate are pixel-identical; was this camera newly added?"
                );
                true
            }
            Some(diff) => {
                tracing::trace!(differing_samples = diff.total(), "snapshots differ");
                false
            }
            None => false,
        };

        let mut normalizer = Normalizer::new(self.config.bounding_box);
        let reference_gray = normalizer
            .normalize(reference)
            .map_err(|reason| CompareError::Normalize {
                role: ImageRole::Reference,
                reason,
            })?;
        let candidate_gray = normalizer
            .normalize(candidate)
            .map_err(|reason| CompareError::Normalize {
                role: ImageRole::Candidate,
                reason,
            })?;

        tracing::debug!(
            reference_width = reference.width(),
            reference_height = reference.height(),
            candidate_width = candidate.width(),
            candidate_height = candidate.height(),
            normalized_reference = ?reference_gray.dimensions(),
            normalized_candidate = ?candidate_gray.dimensions(),
            "normalized images"
        );

        let reference_features = self.extractor.extract(&reference_gray);
        let candidate_features = self.extractor.extract(&candidate_gray);

        let ratio = RatioTest::new(self.config.match_ratio);
        let matches = if reference_features.is_empty() || candidate_features.is_empty() {
            Vec::new()
        } else {
            match_features(
                &reference_features,
                &candidate_features,
                self.matcher.as_ref(),
                ratio,
            )
        };
        let good_matches = matches.len();

        let suspect_reason = if reference_features.is_empty() {
            Some(SuspectReason::NoReferenceFeatures)
        } else if candidate_features.is_empty() {
            Some(SuspectReason::NoCandidateFeatures)
        } else if good_matches < self.config.min_good_matches {
            Some(SuspectReason::TooFewMatches)
        } else {
            None
        };
        let verdict = if suspect_reason.is_some() {
            SceneVerdict::Suspect
        } else {
            SceneVerdict::Stable
        };

        tracing::debug!(
            extractor = %self.extractor.kind(),
            matcher = self.matcher.name(),
            ratio = ratio.ratio(),
            reference_keypoints = reference_features.len(),
            candidate_keypoints = candidate_features.len(),
            good_points = good_matches,
            %verdict,
            "compared scene"
        );

        let diagnostic = if self.config.render_diagnostic {
            match MatchVisualizer::new().render(
                &reference_gray,
                reference_features.keypoints(),
                &candidate_gray,
                candidate_features.keypoints(),
                &matches,
            ) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!("could not render match diagnostic: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(MatchResult {
            verdict,
            good_matches,
            reference_keypoints: reference_features.len(),
            candidate_keypoints: candidate_features.len(),
            pixel_identical,
            suspect_reason,
            diagnostic,
        })
    }
}

impl Default for SceneComparator {
    fn default() -> Self {
        Self::new(ComparatorConfig::default())
    }
}

fn ensure_pixels(image: &DynamicImage, role: ImageRole) -> Result<(), CompareError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(CompareError::Decode {
            role,
            source: DecodeError::ZeroDimensions {
                width: image.width(),
                height: image.height(),
            },
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// Deterministic textured scene, defined on a 320x180 frame and
    /// sampled at any resolution
    fn textured_scene(width: u32, height: u32) -> DynamicImage {
        let blobs: Vec<(f32, f32, f32, f32)> = (0..24u32)
            .map(|i| {
                let h = i.wrapping_mul(2654435761).rotate_left(7) ^ 0x9E37_79B9;
                let cx = 40.0 + (h % 240) as f32;
                let cy = 25.0 + ((h >> 9) % 130) as f32;
                let radius = 3.0 + ((h >> 17) % 9) as f32;
                let value = 25.0 + ((h >> 3) % 200) as f32;
                (cx, cy, radius, value)
            })
            .collect();

        let image = GrayImage::from_fn(width, height, |x, y| {
            let u = x as f32 * 320.0 / width as f32;
            let v = y as f32 * 180.0 / height as f32;
            let mut value = 128.0
                + 30.0 * (u * 0.13 + v * 0.05).sin()
                + 25.0 * (v * 0.21 - u * 0.07).sin();
            for &(cx, cy, radius, intensity) in &blobs {
                let d = ((u - cx).powi(2) + (v - cy).powi(2)).sqrt();
                if d < radius {
                    value = intensity;
                }
            }
            Luma([value.clamp(0.0, 255.0) as u8])
        });
        DynamicImage::ImageLuma8(image)
    }

    fn small_config() -> ComparatorConfig {
        ComparatorConfig::new().bounding_box(320, 180)
    }

    #[test]
    fn identical_scenes_are_stable() {
        let scene = textured_scene(320, 180);
        let result = SceneComparator::new(small_config())
            .compare(&scene, &scene)
            .unwrap();

        assert_eq!(result.verdict, SceneVerdict::Stable);
        assert!(result.pixel_identical);
        assert!(result.good_matches >= 10);
        assert!(result.good_matches <= result.reference_keypoints);
        assert!(result.suspect_reason.is_none());
    }

    #[test]
    fn comparison_is_deterministic() {
        let reference = textured_scene(320, 180);
        let candidate = textured_scene(400, 225);
        let comparator = SceneComparator::new(small_config());

        let first = comparator.compare(&reference, &candidate).unwrap();
        let second = comparator.compare(&reference, &candidate).unwrap();

        assert_eq!(first.verdict, second.verdict);
        assert_eq!(first.good_matches, second.good_matches);
        assert!(!first.pixel_identical);
    }

    #[test]
    fn one_changed_pixel_is_not_identical() {
        let reference = textured_scene(320, 180);
        let mut altered = reference.to_luma8();
        let Luma([value]) = *altered.get_pixel(0, 0);
        altered.put_pixel(0, 0, Luma([value.wrapping_add(1)]));
        let candidate = DynamicImage::ImageLuma8(altered);

        let result = SceneComparator::new(small_config())
            .compare(&reference, &candidate)
            .unwrap();

        assert!(!result.pixel_identical);
        assert_eq!(result.verdict, SceneVerdict::Stable);
    }

    #[test]
    fn uniform_images_are_suspect_even_with_zero_minimum() {
        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(320, 180, Luma([90])));
        let result = SceneComparator::new(small_config().min_good_matches(0))
            .compare(&flat, &flat)
            .unwrap();

        assert_eq!(result.verdict, SceneVerdict::Suspect);
        assert_eq!(result.suspect_reason, Some(SuspectReason::NoReferenceFeatures));
        assert_eq!(result.good_matches, 0);
    }

    #[test]
    fn featureless_candidate_is_suspect() {
        let scene = textured_scene(320, 180);
        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(320, 180, Luma([90])));
        let result = SceneComparator::new(small_config().min_good_matches(0))
            .compare(&scene, &flat)
            .unwrap();

        assert_eq!(result.suspect_reason, Some(SuspectReason::NoCandidateFeatures));
    }

    #[test]
    fn unreachable_minimum_is_suspect() {
        let scene = textured_scene(320, 180);
        let result = SceneComparator::new(small_config().min_good_matches(usize::MAX))
            .compare(&scene, &scene)
            .unwrap();

        assert_eq!(result.verdict, SceneVerdict::Suspect);
        assert_eq!(result.suspect_reason, Some(SuspectReason::TooFewMatches));
    }

    #[test]
    fn diagnostic_is_side_by_side() {
        let scene = textured_scene(320, 180);
        let result = SceneComparator::new(small_config())
            .compare(&scene, &scene)
            .unwrap();

        let diagnostic = result.diagnostic.unwrap();
        assert_eq!(diagnostic.dimensions(), (640, 180));
    }

    #[test]
    fn diagnostic_can_be_disabled() {
        let scene = textured_scene(320, 180);
        let result = SceneComparator::new(small_config().render_diagnostic(false))
            .compare(&scene, &scene)
            .unwrap();
        assert!(result.diagnostic.is_none());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let scene = textured_scene(64, 36);
        let result = SceneComparator::new(small_config().match_ratio(1.0)).compare(&scene, &scene);
        assert!(matches!(result, Err(CompareError::InvalidConfig(_))));
    }

    #[test]
    fn zero_sized_image_is_a_decode_error() {
        let scene = textured_scene(64, 36);
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let err = SceneComparator::new(small_config())
            .compare(&scene, &empty)
            .unwrap_err();

        assert!(err.is_decode());
        assert!(err.to_string().contains("candidate"));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = SceneComparator::new(small_config())
            .compare_encoded(&[0xFF, 0xD8, 0xFF, 0x00, 0x13], &[1, 2, 3])
            .unwrap_err();

        assert!(matches!(
            err,
            CompareError::Decode {
                role: ImageRole::Reference,
                ..
            }
        ));
    }

    #[test]
    fn empty_bytes_are_a_decode_error() {
        let err = SceneComparator::default()
            .compare_encoded(&[], &[])
            .unwrap_err();
        assert!(err.is_decode());
    }
}
