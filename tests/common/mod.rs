//! Synthetic camera scenes shared by the integration tests.

#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};

/// Scenes are defined on this frame and sampled at any resolution
const FRAME: (f32, f32) = (640.0, 360.0);

/// Part of the frame, as fractions of width and height
#[derive(Clone, Copy)]
pub struct Region {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Region {
    pub const fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Share of the frame this region covers
    pub fn area(&self) -> f32 {
        (self.right - self.left) * (self.bottom - self.top)
    }

    fn contains(&self, u: f32, v: f32) -> bool {
        u > FRAME.0 * self.left
            && u < FRAME.0 * self.right
            && v > FRAME.1 * self.top
            && v < FRAME.1 * self.bottom
    }
}

/// Texture of [`scene`]: the central 10-90% of the frame
pub const CENTRAL: Region = Region::new(0.1, 0.9, 0.1, 0.9);

struct Blob {
    cx: f32,
    cy: f32,
    radius: f32,
    color: [f32; 3],
    square: bool,
}

fn blobs(region: Region) -> Vec<Blob> {
    let left = (FRAME.0 * region.left).round() as u32;
    let top = (FRAME.1 * region.top).round() as u32;
    let span_x = (FRAME.0 * (region.right - region.left)).round() as u32 - 32;
    let span_y = (FRAME.1 * (region.bottom - region.top)).round() as u32 - 18;
    (0..48u32)
        .map(|i| {
            let h = i.wrapping_mul(2654435761).rotate_left(11) ^ 0x85EB_CA6B;
            let cx = (left + 16 + h % span_x) as f32;
            let cy = (top + 9 + (h >> 10) % span_y) as f32;
            let radius = 5.0 + ((h >> 19) % 16) as f32;
            let base = 20.0 + ((h >> 4) % 210) as f32;
            Blob {
                cx,
                cy,
                radius,
                color: [base, (base * 1.7) % 235.0 + 10.0, 255.0 - base],
                square: i % 3 == 0,
            }
        })
        .collect()
}

/// A textured RGB street-camera stand-in: flat border, sinusoid texture
/// with scattered discs and squares in the middle
pub fn scene(width: u32, height: u32) -> DynamicImage {
    textured_scene(width, height, CENTRAL)
}

/// Flat grey frame with texture, discs and squares only inside `region`
pub fn textured_scene(width: u32, height: u32, region: Region) -> DynamicImage {
    let blobs = blobs(region);
    let image = RgbImage::from_fn(width, height, |x, y| {
        let u = (x as f32 + 0.5) * FRAME.0 / width as f32;
        let v = (y as f32 + 0.5) * FRAME.1 / height as f32;

        if !region.contains(u, v) {
            return Rgb([128, 128, 128]);
        }

        let texture = 30.0 * (u * 0.071 + v * 0.023).sin() + 22.0 * (v * 0.113 - u * 0.041).sin();
        let mut color = [128.0 + texture, 120.0 + texture * 0.8, 110.0 + texture * 0.6];
        for blob in &blobs {
            let hit = if blob.square {
                (u - blob.cx).abs() < blob.radius && (v - blob.cy).abs() < blob.radius
            } else {
                (u - blob.cx).powi(2) + (v - blob.cy).powi(2) < blob.radius.powi(2)
            };
            if hit {
                color = blob.color;
            }
        }
        Rgb(color.map(|c| c.clamp(0.0, 255.0) as u8))
    });
    DynamicImage::ImageRgb8(image)
}

/// The scene with a flat box over the central 5-95% of the frame
pub fn occluded_scene(width: u32, height: u32) -> DynamicImage {
    occlude(&scene(width, height), Region::new(0.05, 0.95, 0.05, 0.95))
}

/// Paint a flat dark box over `region`, like a parked truck
pub fn occlude(image: &DynamicImage, region: Region) -> DynamicImage {
    let mut image = image.to_rgb8();
    let (width, height) = (image.width() as f32, image.height() as f32);
    let (x0, x1) = ((width * region.left) as u32, (width * region.right) as u32);
    let (y0, y1) = ((height * region.top) as u32, (height * region.bottom) as u32);
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, Rgb([40, 40, 40]));
        }
    }
    DynamicImage::ImageRgb8(image)
}

/// Encode as JPEG at the given quality
pub fn jpeg(image: &DynamicImage, quality: u8) -> Vec<u8> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&image.to_rgb8())
        .unwrap();
    bytes
}
