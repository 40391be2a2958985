//! Trait definitions for descriptor matching.

use crate::core::features::Descriptor;
use serde::{Deserialize, Serialize};

/// One neighbour of a query descriptor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Index into the train (candidate) descriptors
    pub train_index: usize,
    /// Euclidean distance to the query descriptor
    pub distance: f32,
}

/// The two nearest neighbours of one query descriptor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborPair {
    /// Index into the query (reference) descriptors
    pub query_index: usize,
    pub nearest: Neighbor,
    /// Missing when the train set holds a single descriptor
    pub second: Option<Neighbor>,
}

/// Strategy trait for two-nearest-neighbour search
pub trait DescriptorMatcher: Send + Sync {
    /// For every query descriptor, find its two nearest train descriptors.
    ///
    /// Returns one pair per query descriptor, in query order. Returns
    /// nothing when `train` is empty.
    fn knn2(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<NeighborPair>;

    /// Human-readable name of the search strategy
    fn name(&self) -> &'static str;
}

/// Lowe's ratio test over nearest-neighbour pairs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioTest {
    ratio: f32,
}

impl RatioTest {
    /// Create a ratio test (lower = stricter)
    pub fn new(ratio: f32) -> Self {
        Self { ratio }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Accept when the nearest neighbour is strictly closer than `ratio`
    /// times the second nearest. A pair without a second neighbour is
    /// never accepted.
    pub fn accepts(&self, pair: &NeighborPair) -> bool {
        match pair.second {
            Some(second) => pair.nearest.distance < self.ratio * second.distance,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(nearest: f32, second: Option<f32>) -> NeighborPair {
        NeighborPair {
            query_index: 0,
            nearest: Neighbor {
                train_index: 0,
                distance: nearest,
            },
            second: second.map(|distance| Neighbor {
                train_index: 1,
                distance,
            }),
        }
    }

    #[test]
    fn ratio_test_is_strict() {
        let test = RatioTest::new(0.5);
        assert!(test.accepts(&pair(4.9, Some(10.0))));
        assert!(!test.accepts(&pair(5.0, Some(10.0))));
    }

    #[test]
    fn ratio_test_rejects_ambiguous_zero_distances() {
        let test = RatioTest::new(0.9);
        assert!(!test.accepts(&pair(0.0, Some(0.0))));
        assert!(test.accepts(&pair(0.0, Some(1.0))));
    }

    #[test]
    fn ratio_test_rejects_missing_second_neighbor() {
        let test = RatioTest::new(0.99);
        assert!(!test.accepts(&pair(0.0, None)));
    }
}
