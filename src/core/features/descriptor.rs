//! Orientation assignment and 128-value descriptors.

use super::scale_space::Plane;
use super::types::{Descriptor, DESCRIPTOR_LEN};

const ORI_BINS: usize = 36;
const ORI_SIGMA_FACTOR: f32 = 1.5;
const ORI_RADIUS_FACTOR: f32 = 3.0 * ORI_SIGMA_FACTOR;
const ORI_PEAK_RATIO: f32 = 0.8;

const DESC_WIDTH: usize = 4;
const DESC_BINS: usize = 8;
const DESC_SCALE_FACTOR: f32 = 3.0;
const DESC_MAG_THRESHOLD: f32 = 0.2;
const DESC_INT_FACTOR: f32 = 512.0;

/// Gradient at an interior pixel as (magnitude, angle in degrees [0, 360)).
///
/// `dy` points up, so angles run counter-clockwise on screen.
#[inline]
fn gradient(image: &Plane, x: usize, y: usize) -> (f32, f32) {
    let dx = image.get(x + 1, y) - image.get(x - 1, y);
    let dy = image.get(x, y - 1) - image.get(x, y + 1);
    let magnitude = (dx * dx + dy * dy).sqrt();
    let mut angle = dy.atan2(dx).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    if angle >= 360.0 {
        angle -= 360.0;
    }
    (magnitude, angle)
}

/// Dominant orientations (degrees) around `(x, y)` at octave scale `scale`.
///
/// Every histogram peak within 80% of the maximum produces one orientation.
pub(crate) fn dominant_orientations(image: &Plane, x: usize, y: usize, scale: f32) -> Vec<f32> {
    let radius = (ORI_RADIUS_FACTOR * scale).round() as isize;
    let sigma = ORI_SIGMA_FACTOR * scale;
    let exp_scale = -1.0 / (2.0 * sigma * sigma);

    let mut raw = [0f32; ORI_BINS];
    for i in -radius..=radius {
        let yy = y as isize + i;
        if yy <= 0 || yy >= image.height as isize - 1 {
            continue;
        }
        for j in -radius..=radius {
            let xx = x as isize + j;
            if xx <= 0 || xx >= image.width as isize - 1 {
                continue;
            }
            let (magnitude, angle) = gradient(image, xx as usize, yy as usize);
            let weight = (((i * i + j * j) as f32) * exp_scale).exp();
            let mut bin = (ORI_BINS as f32 / 360.0 * angle).round() as isize;
            if bin >= ORI_BINS as isize {
                bin -= ORI_BINS as isize;
            }
            if bin < 0 {
                bin += ORI_BINS as isize;
            }
            raw[bin as usize] += weight * magnitude;
        }
    }

    let n = ORI_BINS;
    let mut hist = [0f32; ORI_BINS];
    for (i, h) in hist.iter_mut().enumerate() {
        let at = |offset: isize| raw[((i as isize + offset).rem_euclid(n as isize)) as usize];
        *h = (at(-2) + at(2)) * (1.0 / 16.0) + (at(-1) + at(1)) * (4.0 / 16.0) + at(0) * (6.0 / 16.0);
    }

    let max = hist.iter().cloned().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let threshold = max * ORI_PEAK_RATIO;

    let mut orientations = Vec::new();
    for j in 0..n {
        let left = hist[(j + n - 1) % n];
        let right = hist[(j + 1) % n];
        let value = hist[j];
        if value > left && value > right && value >= threshold {
            let mut bin = j as f32 + 0.5 * (left - right) / (left - 2.0 * value + right);
            if bin < 0.0 {
                bin += n as f32;
            } else if bin >= n as f32 {
                bin -= n as f32;
            }
            let mut angle = 360.0 / n as f32 * bin;
            if angle >= 360.0 {
                angle -= 360.0;
            }
            orientations.push(angle);
        }
    }
    orientations
}

/// Build the descriptor for a keypoint at `(x, y)` with orientation
/// `angle` (degrees) and octave scale `scale`.
pub(crate) fn describe(image: &Plane, x: usize, y: usize, angle: f32, scale: f32) -> Descriptor {
    let d = DESC_WIDTH;
    let n = DESC_BINS;
    let bins_per_degree = n as f32 / 360.0;
    let exp_scale = -1.0 / (d as f32 * d as f32 * 0.5);
    let hist_width = DESC_SCALE_FACTOR * scale;

    let max_radius = ((image.width * image.width + image.height * image.height) as f32).sqrt();
    let radius = (hist_width * std::f32::consts::SQRT_2 * (d as f32 + 1.0) * 0.5)
        .round()
        .min(max_radius) as isize;

    let (sin_t, cos_t) = angle.to_radians().sin_cos();
    let cos_t = cos_t / hist_width;
    let sin_t = sin_t / hist_width;

    let row_stride = (d + 2) * (n + 2);
    let mut hist = vec![0f32; (d + 2) * row_stride];

    for i in -radius..=radius {
        for j in -radius..=radius {
            let c_rot = j as f32 * cos_t - i as f32 * sin_t;
            let r_rot = j as f32 * sin_t + i as f32 * cos_t;
            let rbin = r_rot + d as f32 / 2.0 - 0.5;
            let cbin = c_rot + d as f32 / 2.0 - 0.5;
            let r = y as isize + i;
            let c = x as isize + j;

            if rbin <= -1.0 || rbin >= d as f32 || cbin <= -1.0 || cbin >= d as f32 {
                continue;
            }
            if r <= 0 || r >= image.height as isize - 1 || c <= 0 || c >= image.width as isize - 1 {
                continue;
            }

            let (magnitude, ori) = gradient(image, c as usize, r as usize);
            let weight = ((c_rot * c_rot + r_rot * r_rot) * exp_scale).exp();
            let obin = (ori - angle) * bins_per_degree;
            let mag = magnitude * weight;

            let r0 = rbin.floor();
            let c0 = cbin.floor();
            let o0 = obin.floor();
            let rf = rbin - r0;
            let cf = cbin - c0;
            let of = obin - o0;

            let mut o0 = o0 as isize;
            if o0 < 0 {
                o0 += n as isize;
            }
            if o0 >= n as isize {
                o0 -= n as isize;
            }

            // Trilinear split over row, column, orientation
            let v_r1 = mag * rf;
            let v_r0 = mag - v_r1;
            let v_rc11 = v_r1 * cf;
            let v_rc10 = v_r1 - v_rc11;
            let v_rc01 = v_r0 * cf;
            let v_rc00 = v_r0 - v_rc01;
            let v_rco111 = v_rc11 * of;
            let v_rco110 = v_rc11 - v_rco111;
            let v_rco101 = v_rc10 * of;
            let v_rco100 = v_rc10 - v_rco101;
            let v_rco011 = v_rc01 * of;
            let v_rco010 = v_rc01 - v_rco011;
            let v_rco001 = v_rc00 * of;
            let v_rco000 = v_rc00 - v_rco001;

            let idx = ((r0 as isize + 1) as usize * (d + 2) + (c0 as isize + 1) as usize) * (n + 2)
                + o0 as usize;
            hist[idx] += v_rco000;
            hist[idx + 1] += v_rco001;
            hist[idx + (n + 2)] += v_rco010;
            hist[idx + (n + 3)] += v_rco011;
            hist[idx + row_stride] += v_rco100;
            hist[idx + row_stride + 1] += v_rco101;
            hist[idx + row_stride + (n + 2)] += v_rco110;
            hist[idx + row_stride + (n + 3)] += v_rco111;
        }
    }

    let mut descriptor = [0f32; DESCRIPTOR_LEN];
    for i in 0..d {
        for j in 0..d {
            let idx = ((i + 1) * (d + 2) + (j + 1)) * (n + 2);
            // Fold the wrap-around orientation bins back in
            hist[idx] += hist[idx + n];
            hist[idx + 1] += hist[idx + n + 1];
            for k in 0..n {
                descriptor[(i * d + j) * n + k] = hist[idx + k];
            }
        }
    }

    normalize_descriptor(&mut descriptor);
    descriptor
}

fn normalize_descriptor(descriptor: &mut Descriptor) {
    let norm = descriptor.iter().map(|v| v * v).sum::<f32>().sqrt();
    let threshold = norm * DESC_MAG_THRESHOLD;
    for v in descriptor.iter_mut() {
        *v = v.min(threshold);
    }

    let norm = descriptor.iter().map(|v| v * v).sum::<f32>().sqrt();
    let scale = DESC_INT_FACTOR / norm.max(f32::EPSILON);
    for v in descriptor.iter_mut() {
        *v = (*v * scale).round().clamp(0.0, 255.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn plane_from_fn(size: u32, f: impl Fn(u32, u32) -> u8) -> Plane {
        Plane::from_gray(&GrayImage::from_fn(size, size, |x, y| Luma([f(x, y)])))
    }

    #[test]
    fn horizontal_ramp_points_at_zero_degrees() {
        let plane = plane_from_fn(41, |x, _| (x * 6) as u8);
        let orientations = dominant_orientations(&plane, 20, 20, 2.0);
        assert_eq!(orientations.len(), 1);
        let angle = orientations[0];
        assert!(angle < 5.0 || angle > 355.0, "angle was {}", angle);
    }

    #[test]
    fn flat_patch_has_no_orientation() {
        let plane = plane_from_fn(41, |_, _| 90);
        assert!(dominant_orientations(&plane, 20, 20, 2.0).is_empty());
    }

    #[test]
    fn descriptor_values_are_bounded() {
        let plane = plane_from_fn(64, |x, y| (((x / 4) ^ (y / 4)) * 30 % 256) as u8);
        let descriptor = describe(&plane, 32, 32, 45.0, 3.0);
        assert!(descriptor.iter().all(|v| (0.0..=255.0).contains(v)));
        assert!(descriptor.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn descriptor_is_deterministic() {
        let plane = plane_from_fn(64, |x, y| ((x * 7 + y * 13) % 256) as u8);
        let a = describe(&plane, 30, 30, 120.0, 2.5);
        let b = describe(&plane, 30, 30, 120.0, 2.5);
        assert_eq!(a, b);
    }
}
