//! Luma conversion and bounding-box rescaling.
//!
//! Both images of a comparison are brought to single-channel luma and
//! rescaled so they fit the same bounding box, which keeps descriptor cost
//! bounded and makes cameras of different native resolutions comparable.
//!
//! Uses fast_image_resize (SIMD accelerated). Shrinking uses area averaging
//! (box convolution); enlarging uses bilinear interpolation.

use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Default bounding box: half of 1080p
pub const DEFAULT_BOUNDING_BOX: (u32, u32) = (960, 540);

/// Compute the target size for fitting `(width, height)` into the box.
///
/// The factor is `min(box_w / w, box_h / h)` and may exceed 1, so small
/// images are enlarged. Dimensions are truncated and never drop below 1.
pub fn fit_dimensions(width: u32, height: u32, bounding_box: (u32, u32)) -> (u32, u32) {
    let factor = scale_factor(width, height, bounding_box);
    let new_width = ((width as f64 * factor) as u32).max(1);
    let new_height = ((height as f64 * factor) as u32).max(1);
    (new_width, new_height)
}

fn scale_factor(width: u32, height: u32, (box_w, box_h): (u32, u32)) -> f64 {
    let fx = box_w as f64 / width as f64;
    let fy = box_h as f64 / height as f64;
    fx.min(fy)
}

/// Rescales luma images into a fixed bounding box
pub struct Normalizer {
    resizer: Resizer,
    bounding_box: (u32, u32),
}

impl Normalizer {
    /// Create a normalizer for the given bounding box
    pub fn new(bounding_box: (u32, u32)) -> Self {
        Self {
            resizer: Resizer::new(),
            bounding_box,
        }
    }

    /// The bounding box images are fitted into
    pub fn bounding_box(&self) -> (u32, u32) {
        self.bounding_box
    }

    /// Convert to luma and fit into the bounding box.
    pub fn normalize(&mut self, image: &DynamicImage) -> Result<GrayImage, String> {
        let gray = image.to_luma8();
        let (src_width, src_height) = gray.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err("source image has no pixels".to_string());
        }
        if self.bounding_box.0 == 0 || self.bounding_box.1 == 0 {
            return Err("bounding box has no area".to_string());
        }

        let (width, height) = fit_dimensions(src_width, src_height, self.bounding_box);
        if (width, height) == (src_width, src_height) {
            return Ok(gray);
        }

        let shrinking = scale_factor(src_width, src_height, self.bounding_box) < 1.0;
        let filter = if shrinking {
            FilterType::Box
        } else {
            FilterType::Bilinear
        };

        let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
            .map_err(|e| format!("Failed to create source image: {}", e))?;

        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(filter));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| format!("Resize failed: {}", e))?;

        let result: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, dst_image.into_vec())
                .ok_or_else(|| "Failed to create result buffer".to_string())?;

        Ok(result)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDING_BOX)
    }
}
