//! Gaussian and difference-of-Gaussian pyramids.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Camera blur assumed to be present in the input image
const ASSUMED_INPUT_BLUR: f32 = 0.5;

/// Octaves stop once the smaller side would drop below this
const MIN_OCTAVE_SIDE: usize = 16;

const MAX_OCTAVES: usize = 8;

type LumaF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// A single-channel `f32` image
#[derive(Debug, Clone)]
pub(crate) struct Plane {
    pub width: usize,
    pub height: usize,
    image: LumaF32,
}

impl Plane {
    fn wrap(image: LumaF32) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            image,
        }
    }

    /// Luma in [0, 1]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self::wrap(ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y)[0] as f32 / 255.0])
        }))
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.image.as_raw()[y * self.width + x]
    }

    /// Keep every second pixel in both directions
    pub fn decimate(&self) -> Plane {
        let width = (self.width / 2).max(1) as u32;
        let height = (self.height / 2).max(1) as u32;
        let (max_x, max_y) = (self.width - 1, self.height - 1);
        Self::wrap(ImageBuffer::from_fn(width, height, |x, y| {
            Luma([self.get((x as usize * 2).min(max_x), (y as usize * 2).min(max_y))])
        }))
    }

    /// `self - other`, element-wise
    pub fn difference(&self, other: &Plane) -> Plane {
        Self::wrap(ImageBuffer::from_fn(
            self.width as u32,
            self.height as u32,
            |x, y| Luma([self.get(x as usize, y as usize) - other.get(x as usize, y as usize)]),
        ))
    }
}

/// Gaussian blur with replicated borders. Non-positive sigma is a no-op.
pub(crate) fn gaussian_blur(src: &Plane, sigma: f32) -> Plane {
    if sigma <= 0.0 {
        return src.clone();
    }
    Plane::wrap(gaussian_blur_f32(&src.image, sigma))
}

/// One octave: `layers + 3` Gaussians and `layers + 2` DoGs
pub(crate) struct Octave {
    pub gaussians: Vec<Plane>,
    pub dogs: Vec<Plane>,
}

/// Gaussian / DoG pyramid over a luma image
pub(crate) struct ScaleSpace {
    pub octaves: Vec<Octave>,
}

impl ScaleSpace {
    pub fn build(image: &GrayImage, layers: usize, sigma: f32) -> Self {
        let base_plane = Plane::from_gray(image);
        let initial = (sigma * sigma - ASSUMED_INPUT_BLUR * ASSUMED_INPUT_BLUR)
            .max(0.01)
            .sqrt();
        let base = gaussian_blur(&base_plane, initial);

        let increments = layer_sigmas(layers, sigma);
        let octave_count = octave_count(base.width, base.height);

        let mut octaves: Vec<Octave> = Vec::with_capacity(octave_count);
        for o in 0..octave_count {
            let first = match octaves.last() {
                None => base.clone(),
                Some(previous) => previous.gaussians[layers].decimate(),
            };

            let mut gaussians = Vec::with_capacity(layers + 3);
            gaussians.push(first);
            for i in 1..layers + 3 {
                let next = gaussian_blur(&gaussians[i - 1], increments[i]);
                gaussians.push(next);
            }

            let dogs = gaussians
                .windows(2)
                .map(|pair| pair[1].difference(&pair[0]))
                .collect();

            tracing::trace!(
                octave = o,
                width = gaussians[0].width,
                height = gaussians[0].height,
                "built octave"
            );
            octaves.push(Octave { gaussians, dogs });
        }

        Self { octaves }
    }
}

/// Incremental blur between consecutive Gaussian layers of an octave
fn layer_sigmas(layers: usize, sigma: f32) -> Vec<f32> {
    let k = 2f32.powf(1.0 / layers as f32);
    let mut sigmas = vec![sigma; layers + 3];
    for (i, s) in sigmas.iter_mut().enumerate().skip(1) {
        let previous = k.powi(i as i32 - 1) * sigma;
        let total = previous * k;
        *s = (total * total - previous * previous).sqrt();
    }
    sigmas
}

fn octave_count(width: usize, height: usize) -> usize {
    let mut count = 1;
    let mut side = width.min(height) / 2;
    while side >= MIN_OCTAVE_SIDE && count < MAX_OCTAVES {
        count += 1;
        side /= 2;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn decimate_keeps_even_samples() {
        let image = GrayImage::from_fn(6, 4, |x, y| Luma([(x + 10 * y) as u8]));
        let half = Plane::from_gray(&image).decimate();
        assert_eq!((half.width, half.height), (3, 2));
        assert!((half.get(1, 1) - 22.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn blur_with_zero_sigma_is_identity() {
        let image = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 30 + y) as u8]));
        let plane = Plane::from_gray(&image);
        let same = gaussian_blur(&plane, 0.0);
        assert_eq!(same.get(7, 3), plane.get(7, 3));
    }

    #[test]
    fn blur_keeps_uniform_plane_uniform() {
        let image = GrayImage::from_pixel(20, 12, Luma([100]));
        let blurred = gaussian_blur(&Plane::from_gray(&image), 2.0);
        let expected = 100.0 / 255.0;
        for y in 0..12 {
            for x in 0..20 {
                assert!((blurred.get(x, y) - expected).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn octaves_halve_until_minimum_side() {
        assert_eq!(octave_count(960, 540), 6);
        assert_eq!(octave_count(20, 20), 1);
        assert_eq!(octave_count(8, 8), 1);
    }

    #[test]
    fn scale_space_has_expected_layer_counts() {
        let image = GrayImage::from_fn(64, 64, |x, y| Luma([((x * y) % 256) as u8]));
        let space = ScaleSpace::build(&image, 3, 1.6);

        assert_eq!(space.octaves.len(), octave_count(64, 64));
        for octave in &space.octaves {
            assert_eq!(octave.gaussians.len(), 6);
            assert_eq!(octave.dogs.len(), 5);
        }
        assert_eq!(space.octaves[1].gaussians[0].width, 32);
    }

    #[test]
    fn layer_sigmas_compound_to_double() {
        let sigmas = layer_sigmas(3, 1.6);
        // Blurring sigma with increments 1..=layers doubles the total scale
        let total_sq: f32 = 1.6f32.powi(2) + sigmas[1..=3].iter().map(|s| s * s).sum::<f32>();
        assert!((total_sq.sqrt() - 3.2).abs() < 1e-3);
    }
}
