//! Exact two-nearest-neighbour search.

use super::traits::{DescriptorMatcher, Neighbor, NeighborPair};
use crate::core::features::Descriptor;

/// Compares every query descriptor against every train descriptor.
///
/// Ranking uses squared Euclidean distance; reported distances are the
/// square roots. Equal distances resolve to the lower train index.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

impl BruteForceMatcher {
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn squared_distance(a: &Descriptor, b: &Descriptor) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl DescriptorMatcher for BruteForceMatcher {
    fn knn2(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<NeighborPair> {
        if train.is_empty() {
            return Vec::new();
        }

        query
            .iter()
            .enumerate()
            .map(|(query_index, q)| {
                let mut best = (usize::MAX, f32::INFINITY);
                let mut second = (usize::MAX, f32::INFINITY);

                for (train_index, t) in train.iter().enumerate() {
                    let distance = squared_distance(q, t);
                    if distance < best.1 {
                        second = best;
                        best = (train_index, distance);
                    } else if distance < second.1 {
                        second = (train_index, distance);
                    }
                }

                NeighborPair {
                    query_index,
                    nearest: Neighbor {
                        train_index: best.0,
                        distance: best.1.sqrt(),
                    },
                    second: (second.0 != usize::MAX).then(|| Neighbor {
                        train_index: second.0,
                        distance: second.1.sqrt(),
                    }),
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "brute-force"
    }
}
