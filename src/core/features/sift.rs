//! SIFT-style detector: DoG extrema, subpixel refinement, orientation,
//! descriptor.

use super::descriptor::{describe, dominant_orientations};
use super::scale_space::{Octave, Plane, ScaleSpace};
use super::traits::{FeatureExtractor, FeatureExtractorKind};
use super::types::{FeatureSet, Keypoint};
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Pixels near the border of each DoG layer are never searched
const IMAGE_BORDER: usize = 5;

const MAX_INTERP_STEPS: usize = 5;

/// Detector tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiftConfig {
    /// Scale layers searched per octave
    pub layers: usize,
    /// Blur of the base layer
    pub sigma: f32,
    /// Minimum interpolated DoG contrast (images scaled to [0, 1])
    pub contrast_threshold: f32,
    /// Maximum principal curvature ratio; larger keeps more edge-like points
    pub edge_threshold: f32,
    /// Keep only the strongest N features (None = keep all)
    pub max_features: Option<usize>,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            layers: 3,
            sigma: 1.6,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            max_features: None,
        }
    }
}

/// Scale- and rotation-invariant keypoint detector and descriptor
#[derive(Debug, Clone, Default)]
pub struct SiftExtractor {
    config: SiftConfig,
}

/// A refined extremum, in octave coordinates
struct Extremum {
    x: usize,
    y: usize,
    layer: usize,
    offset_x: f32,
    offset_y: f32,
    offset_layer: f32,
    response: f32,
}

impl SiftExtractor {
    pub fn new(config: SiftConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    fn scan_octave(&self, octave_index: usize, octave: &Octave, features: &mut FeatureSet) {
        let layers = self.config.layers;
        let threshold = 0.5 * self.config.contrast_threshold / layers as f32;
        let octave_scale = 2f32.powi(octave_index as i32);

        for layer in 1..=layers {
            let current = &octave.dogs[layer];
            let (width, height) = (current.width, current.height);
            let rows = IMAGE_BORDER..height.saturating_sub(IMAGE_BORDER);
            let cols = IMAGE_BORDER..width.saturating_sub(IMAGE_BORDER);

            for y in rows {
                for x in cols.clone() {
                    let value = current.get(x, y);
                    if value.abs() <= threshold {
                        continue;
                    }
                    if !is_extremum(&octave.dogs, layer, x, y, value) {
                        continue;
                    }
                    let Some(extremum) = self.refine(&octave.dogs, layer, x, y) else {
                        continue;
                    };

                    let scale = self.config.sigma
                        * 2f32.powf((extremum.layer as f32 + extremum.offset_layer) / layers as f32);
                    let gaussian = &octave.gaussians[extremum.layer];
                    let kx = ((extremum.x as f32 + extremum.offset_x).round() as usize)
                        .clamp(1, width - 2);
                    let ky = ((extremum.y as f32 + extremum.offset_y).round() as usize)
                        .clamp(1, height - 2);

                    for angle in dominant_orientations(gaussian, extremum.x, extremum.y, scale) {
                        let keypoint = Keypoint {
                            x: (extremum.x as f32 + extremum.offset_x) * octave_scale,
                            y: (extremum.y as f32 + extremum.offset_y) * octave_scale,
                            size: scale * octave_scale * 2.0,
                            angle,
                            response: extremum.response,
                            octave: octave_index,
                        };
                        let descriptor = describe(gaussian, kx, ky, angle, scale);
                        features.push(keypoint, descriptor);
                    }
                }
            }
        }
    }

    /// Fit a 3D quadratic around a DoG extremum and apply the contrast and
    /// edge tests. Returns None when the point is rejected.
    fn refine(&self, dogs: &[Plane], layer: usize, x: usize, y: usize) -> Option<Extremum> {
        let layers = self.config.layers as isize;
        let width = dogs[0].width as isize;
        let height = dogs[0].height as isize;
        let border = IMAGE_BORDER as isize;

        let (mut x, mut y, mut layer) = (x as isize, y as isize, layer as isize);
        let mut offset = [0f32; 3];
        let mut converged = false;

        for _ in 0..MAX_INTERP_STEPS {
            let sample = Sample::at(dogs, layer as usize, x as usize, y as usize);
            let solution = solve3(&sample.hessian(), &sample.gradient())?;
            offset = [-solution[0], -solution[1], -solution[2]];

            if offset.iter().all(|v| v.abs() < 0.5) {
                converged = true;
                break;
            }
            if offset.iter().any(|v| !v.is_finite() || v.abs() > (i32::MAX / 3) as f32) {
                return None;
            }

            x += offset[0].round() as isize;
            y += offset[1].round() as isize;
            layer += offset[2].round() as isize;

            if layer < 1
                || layer > layers
                || x < border
                || x >= width - border
                || y < border
                || y >= height - border
            {
                return None;
            }
        }

        if !converged {
            return None;
        }

        let sample = Sample::at(dogs, layer as usize, x as usize, y as usize);
        let g = sample.gradient();
        let t = g[0] * offset[0] + g[1] * offset[1] + g[2] * offset[2];
        let contrast = sample.center + t * 0.5;
        if contrast.abs() * (layers as f32) < self.config.contrast_threshold {
            return None;
        }

        let trace = sample.dxx + sample.dyy;
        let det = sample.dxx * sample.dyy - sample.dxy * sample.dxy;
        let edge = self.config.edge_threshold;
        if det <= 0.0 || trace * trace * edge >= (edge + 1.0) * (edge + 1.0) * det {
            return None;
        }

        Some(Extremum {
            x: x as usize,
            y: y as usize,
            layer: layer as usize,
            offset_x: offset[0],
            offset_y: offset[1],
            offset_layer: offset[2],
            response: contrast.abs(),
        })
    }
}

impl FeatureExtractor for SiftExtractor {
    fn extract(&self, image: &GrayImage) -> FeatureSet {
        let mut features = FeatureSet::new();
        if image.width() < 3 || image.height() < 3 || self.config.layers == 0 {
            return features;
        }

        let space = ScaleSpace::build(image, self.config.layers, self.config.sigma);
        for (index, octave) in space.octaves.iter().enumerate() {
            self.scan_octave(index, octave, &mut features);
        }

        features.remove_duplicates();
        if let Some(limit) = self.config.max_features {
            features.retain_strongest(limit);
        }

        tracing::trace!(
            width = image.width(),
            height = image.height(),
            features = features.len(),
            "extracted features"
        );
        features
    }

    fn kind(&self) -> FeatureExtractorKind {
        FeatureExtractorKind::Sift
    }
}

/// 3x3x3 extremum test against the 26 neighbours (ties allowed)
fn is_extremum(dogs: &[Plane], layer: usize, x: usize, y: usize, value: f32) -> bool {
    let planes = [&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]];
    let is_max = value > 0.0;

    for plane in planes {
        for yy in y - 1..=y + 1 {
            for xx in x - 1..=x + 1 {
                let neighbour = plane.get(xx, yy);
                if is_max && neighbour > value {
                    return false;
                }
                if !is_max && neighbour < value {
                    return false;
                }
            }
        }
    }
    true
}

/// First and second finite differences around one DoG sample
struct Sample {
    center: f32,
    dx: f32,
    dy: f32,
    ds: f32,
    dxx: f32,
    dyy: f32,
    dss: f32,
    dxy: f32,
    dxs: f32,
    dys: f32,
}

impl Sample {
    fn at(dogs: &[Plane], layer: usize, x: usize, y: usize) -> Self {
        let prev = &dogs[layer - 1];
        let cur = &dogs[layer];
        let next = &dogs[layer + 1];
        let center = cur.get(x, y);
        let twice = center * 2.0;

        Self {
            center,
            dx: (cur.get(x + 1, y) - cur.get(x - 1, y)) * 0.5,
            dy: (cur.get(x, y + 1) - cur.get(x, y - 1)) * 0.5,
            ds: (next.get(x, y) - prev.get(x, y)) * 0.5,
            dxx: cur.get(x + 1, y) + cur.get(x - 1, y) - twice,
            dyy: cur.get(x, y + 1) + cur.get(x, y - 1) - twice,
            dss: next.get(x, y) + prev.get(x, y) - twice,
            dxy: (cur.get(x + 1, y + 1) - cur.get(x - 1, y + 1) - cur.get(x + 1, y - 1)
                + cur.get(x - 1, y - 1))
                * 0.25,
            dxs: (next.get(x + 1, y) - next.get(x - 1, y) - prev.get(x + 1, y)
                + prev.get(x - 1, y))
                * 0.25,
            dys: (next.get(x, y + 1) - next.get(x, y - 1) - prev.get(x, y + 1)
                + prev.get(x, y - 1))
                * 0.25,
        }
    }

    fn gradient(&self) -> [f32; 3] {
        [self.dx, self.dy, self.ds]
    }

    fn hessian(&self) -> [[f32; 3]; 3] {
        [
            [self.dxx, self.dxy, self.dxs],
            [self.dxy, self.dyy, self.dys],
            [self.dxs, self.dys, self.dss],
        ]
    }
}

/// Solve `m * v = b` by Cramer's rule; None if `m` is singular
fn solve3(m: &[[f32; 3]; 3], b: &[f32; 3]) -> Option<[f32; 3]> {
    let det3 = |m: &[[f32; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };

    let det = det3(m);
    if det.abs() < 1e-12 || !det.is_finite() {
        return None;
    }

    let mut solution = [0f32; 3];
    for (column, value) in solution.iter_mut().enumerate() {
        let mut replaced = *m;
        for row in 0..3 {
            replaced[row][column] = b[row];
        }
        *value = det3(&replaced) / det;
    }
    Some(solution)
}
