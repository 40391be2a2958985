//! # Matcher Module
//!
//! Finds feature correspondences between a reference and a candidate image.
//!
//! ## How It Works
//! 1. For every reference descriptor, find the two nearest candidate descriptors
//! 2. Keep the pair only if the nearest is clearly closer than the second
//!    (ratio test)
//!
//! ## Ratio Guide
//! | Ratio | Effect |
//! |-------|--------|
//! | 0.4   | Strict, only very distinctive matches |
//! | 0.6   | Default |
//! | 0.8   | Lowe's original value, permissive |
//!
//! Lowering the ratio never increases the number of accepted matches.

mod brute_force;
mod traits;

pub use brute_force::BruteForceMatcher;
pub use traits::{DescriptorMatcher, Neighbor, NeighborPair, RatioTest};

use crate::core::features::FeatureSet;
use serde::{Deserialize, Serialize};

/// An accepted reference-to-candidate feature correspondence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Index into the reference feature set
    pub reference_index: usize,
    /// Index into the candidate feature set
    pub candidate_index: usize,
    /// Descriptor distance of the match
    pub distance: f32,
}

/// Match reference features against candidate features and keep the pairs
/// that pass the ratio test, in reference order.
pub fn match_features(
    reference: &FeatureSet,
    candidate: &FeatureSet,
    matcher: &dyn DescriptorMatcher,
    ratio: RatioTest,
) -> Vec<Correspondence> {
    matcher
        .knn2(reference.descriptors(), candidate.descriptors())
        .into_iter()
        .filter(|pair| ratio.accepts(pair))
        .map(|pair| Correspondence {
            reference_index: pair.query_index,
            candidate_index: pair.nearest.train_index,
            distance: pair.nearest.distance,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::{Keypoint, DESCRIPTOR_LEN};

    fn feature_set(values: &[f32]) -> FeatureSet {
        let mut set = FeatureSet::new();
        for (i, &value) in values.iter().enumerate() {
            let keypoint = Keypoint {
                x: i as f32,
                y: 0.0,
                size: 2.0,
                angle: 0.0,
                response: 1.0,
                octave: 0,
            };
            let mut descriptor = [0.0; DESCRIPTOR_LEN];
            descriptor[i % DESCRIPTOR_LEN] = value;
            descriptor[(i + 1) % DESCRIPTOR_LEN] = value / 2.0;
            set.push(keypoint, descriptor);
        }
        set
    }

    #[test]
    fn identical_sets_match_one_to_one() {
        let set = feature_set(&[100.0, 120.0, 140.0, 160.0]);
        let matches = match_features(&set, &set, &BruteForceMatcher, RatioTest::new(0.6));

        assert_eq!(matches.len(), 4);
        for m in &matches {
            assert_eq!(m.reference_index, m.candidate_index);
            assert_eq!(m.distance, 0.0);
        }
    }

    #[test]
    fn empty_candidate_yields_no_matches() {
        let reference = feature_set(&[100.0]);
        let matches = match_features(
            &reference,
            &FeatureSet::new(),
            &BruteForceMatcher,
            RatioTest::new(0.6),
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn lowering_ratio_never_adds_matches() {
        let reference = feature_set(&[100.0, 50.0, 75.0, 20.0, 90.0]);
        let candidate = feature_set(&[95.0, 55.0, 70.0, 30.0, 80.0]);

        let mut previous = usize::MAX;
        for ratio in [0.95, 0.8, 0.6, 0.4, 0.2, 0.05] {
            let count =
                match_features(&reference, &candidate, &BruteForceMatcher, RatioTest::new(ratio))
                    .len();
            assert!(count <= previous, "ratio {} gave {} > {}", ratio, count, previous);
            previous = count;
        }
    }
}
