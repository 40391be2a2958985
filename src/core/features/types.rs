//! Keypoint and feature set types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Number of values in a SIFT descriptor (4x4 cells, 8 orientation bins)
pub const DESCRIPTOR_LEN: usize = 128;

/// A 128-value local appearance descriptor
pub type Descriptor = [f32; DESCRIPTOR_LEN];

/// A detected keypoint in normalized-image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Column, subpixel
    pub x: f32,
    /// Row, subpixel
    pub y: f32,
    /// Diameter of the meaningful neighbourhood
    pub size: f32,
    /// Dominant gradient orientation in degrees, [0, 360)
    pub angle: f32,
    /// Absolute interpolated DoG response (higher = stronger)
    pub response: f32,
    /// Pyramid octave the keypoint was found in
    pub octave: usize,
}

/// Keypoints and their descriptors, index-aligned
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    /// Create an empty feature set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keypoint together with its descriptor
    pub fn push(&mut self, keypoint: Keypoint, descriptor: Descriptor) {
        self.keypoints.push(keypoint);
        self.descriptors.push(descriptor);
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// True when no descriptors were found
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Drop keypoints that repeat an earlier one exactly.
    ///
    /// Neighbouring extrema can refine to the same subpixel location, and
    /// identical twins would defeat the nearest-neighbour ratio test.
    pub fn remove_duplicates(&mut self) {
        let mut seen = HashSet::with_capacity(self.len());
        let mut keep = Vec::with_capacity(self.len());
        for (i, kp) in self.keypoints.iter().enumerate() {
            let key = (
                kp.x.to_bits(),
                kp.y.to_bits(),
                kp.size.to_bits(),
                kp.angle.to_bits(),
            );
            if seen.insert(key) {
                keep.push(i);
            }
        }
        if keep.len() == self.len() {
            return;
        }
        self.keypoints = keep.iter().map(|&i| self.keypoints[i]).collect();
        self.descriptors = keep.iter().map(|&i| self.descriptors[i]).collect();
    }

    /// Keep only the `limit` strongest features.
    ///
    /// Ties keep their detection order.
    pub fn retain_strongest(&mut self, limit: usize) {
        if self.len() <= limit {
            return;
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.keypoints[b]
                .response
                .total_cmp(&self.keypoints[a].response)
        });
        order.truncate(limit);
        order.sort_unstable();

        self.keypoints = order.iter().map(|&i| self.keypoints[i]).collect();
        self.descriptors = order.iter().map(|&i| self.descriptors[i]).collect();
    }
}
