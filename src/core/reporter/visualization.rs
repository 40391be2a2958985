//! Match visualization.
//!
//! Draws the reference and candidate side by side with every accepted
//! correspondence marked, so an operator can see at a glance why a camera
//! was flagged.

use crate::core::features::Keypoint;
use crate::core::matcher::Correspondence;
use crate::error::RenderError;
use image::buffer::ConvertBuffer;
use image::imageops;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

/// Largest canvas the visualizer will allocate
pub const MAX_CANVAS_PIXELS: u64 = 1 << 26;

const PALETTE: [[u8; 3]; 8] = [
    [255, 64, 64],
    [64, 220, 64],
    [64, 128, 255],
    [255, 200, 0],
    [255, 64, 255],
    [0, 220, 220],
    [255, 140, 0],
    [160, 96, 255],
];

/// Draws match diagnostics
pub struct MatchVisualizer {
    /// Smallest circle radius in pixels
    min_radius: i32,
    pixel_limit: u64,
}

impl MatchVisualizer {
    pub fn new() -> Self {
        Self {
            min_radius: 3,
            pixel_limit: MAX_CANVAS_PIXELS,
        }
    }

    /// Override the canvas size limit
    pub fn pixel_limit(mut self, limit: u64) -> Self {
        self.pixel_limit = limit;
        self
    }

    /// Render both images side by side and connect matched keypoints.
    ///
    /// The reference is drawn on the left and the candidate on the right.
    /// Match `i` uses palette color `i % 8`.
    pub fn render(
        &self,
        reference: &GrayImage,
        reference_keypoints: &[Keypoint],
        candidate: &GrayImage,
        candidate_keypoints: &[Keypoint],
        matches: &[Correspondence],
    ) -> Result<RgbImage, RenderError> {
        let width = reference.width().saturating_add(candidate.width());
        let height = reference.height().max(candidate.height());
        if width as u64 * height as u64 > self.pixel_limit {
            return Err(RenderError::CanvasTooLarge {
                width,
                height,
                limit: self.pixel_limit,
            });
        }

        let mut canvas = RgbImage::new(width, height);
        let left: RgbImage = reference.convert();
        let right: RgbImage = candidate.convert();
        imageops::replace(&mut canvas, &left, 0, 0);
        imageops::replace(&mut canvas, &right, i64::from(reference.width()), 0);

        let offset = reference.width() as f32;
        for (i, m) in matches.iter().enumerate() {
            let a = reference_keypoints.get(m.reference_index).ok_or(
                RenderError::KeypointOutOfRange {
                    index: m.reference_index,
                    len: reference_keypoints.len(),
                },
            )?;
            let b = candidate_keypoints.get(m.candidate_index).ok_or(
                RenderError::KeypointOutOfRange {
                    index: m.candidate_index,
                    len: candidate_keypoints.len(),
                },
            )?;

            let color = Rgb(PALETTE[i % PALETTE.len()]);
            let (ax, ay) = (a.x.round(), a.y.round());
            let (bx, by) = ((b.x + offset).round(), b.y.round());

            draw_hollow_circle_mut(&mut canvas, (ax as i32, ay as i32), self.radius(a), color);
            draw_hollow_circle_mut(&mut canvas, (bx as i32, by as i32), self.radius(b), color);
            draw_line_segment_mut(&mut canvas, (ax, ay), (bx, by), color);
        }

        Ok(canvas)
    }

    /// One-line match summary, e.g. `42 of 310 reference features matched (13.5%)`
    pub fn summarize(&self, good_matches: usize, reference_keypoints: usize) -> String {
        let percent = if reference_keypoints == 0 {
            0.0
        } else {
            good_matches as f64 / reference_keypoints as f64 * 100.0
        };
        format!(
            "{} of {} reference features matched ({:.1}%)",
            good_matches, reference_keypoints, percent
        )
    }

    /// Bar showing progress towards the match minimum:
    /// `[██████░░░░] 6/10`
    pub fn threshold_bar(&self, good_matches: usize, min_good_matches: usize) -> String {
        let filled = if min_good_matches == 0 {
            10
        } else {
            (good_matches.min(min_good_matches) * 10 / min_good_matches).min(10)
        };
        format!(
            "[{}{}] {}/{}",
            "█".repeat(filled),
            "░".repeat(10 - filled),
            good_matches,
            min_good_matches
        )
    }

    fn radius(&self, keypoint: &Keypoint) -> i32 {
        ((keypoint.size / 2.0).round() as i32).max(self.min_radius)
    }
}

impl Default for MatchVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn keypoint(x: f32, y: f32) -> Keypoint {
        Keypoint {
            x,
            y,
            size: 8.0,
            angle: 0.0,
            response: 1.0,
            octave: 0,
        }
    }

    #[test]
    fn canvas_places_images_side_by_side() {
        let reference = GrayImage::from_pixel(40, 30, Luma([10]));
        let candidate = GrayImage::from_pixel(20, 50, Luma([200]));

        let canvas = MatchVisualizer::new()
            .render(&reference, &[], &candidate, &[], &[])
            .unwrap();

        assert_eq!(canvas.dimensions(), (60, 50));
        assert_eq!(canvas.get_pixel(5, 5), &Rgb([10, 10, 10]));
        assert_eq!(canvas.get_pixel(45, 45), &Rgb([200, 200, 200]));
        // Below the shorter reference stays black
        assert_eq!(canvas.get_pixel(5, 45), &Rgb([0, 0, 0]));
    }

    #[test]
    fn matches_are_drawn_in_palette_color() {
        let image = GrayImage::from_pixel(40, 40, Luma([128]));
        let matches = [Correspondence {
            reference_index: 0,
            candidate_index: 0,
            distance: 0.0,
        }];

        let canvas = MatchVisualizer::new()
            .render(
                &image,
                &[keypoint(10.0, 20.0)],
                &image,
                &[keypoint(10.0, 20.0)],
                &matches,
            )
            .unwrap();

        // Midpoint of the connecting line
        assert_eq!(canvas.get_pixel(30, 20), &Rgb(PALETTE[0]));
        // Rightmost point of the reference circle
        assert_eq!(canvas.get_pixel(14, 20), &Rgb(PALETTE[0]));
    }

    #[test]
    fn marks_at_the_border_are_clipped() {
        let image = GrayImage::from_pixel(12, 12, Luma([50]));
        let matches = [Correspondence {
            reference_index: 0,
            candidate_index: 0,
            distance: 0.0,
        }];

        let canvas = MatchVisualizer::new()
            .render(
                &image,
                &[keypoint(0.0, 0.0)],
                &image,
                &[keypoint(11.0, 11.0)],
                &matches,
            )
            .unwrap();

        assert_eq!(canvas.dimensions(), (24, 12));
        // Bottom of the reference circle, top of the candidate circle
        assert_eq!(canvas.get_pixel(0, 4), &Rgb(PALETTE[0]));
        assert_eq!(canvas.get_pixel(23, 7), &Rgb(PALETTE[0]));
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let image = GrayImage::new(100, 100);
        let err = MatchVisualizer::new()
            .pixel_limit(1000)
            .render(&image, &[], &image, &[], &[])
            .unwrap_err();
        assert!(matches!(err, RenderError::CanvasTooLarge { width: 200, .. }));
    }

    #[test]
    fn out_of_range_keypoint_is_rejected() {
        let image = GrayImage::new(10, 10);
        let matches = [Correspondence {
            reference_index: 3,
            candidate_index: 0,
            distance: 0.0,
        }];
        let err = MatchVisualizer::new()
            .render(&image, &[], &image, &[keypoint(1.0, 1.0)], &matches)
            .unwrap_err();
        assert!(matches!(err, RenderError::KeypointOutOfRange { index: 3, len: 0 }));
    }

    #[test]
    fn summarize_reports_share() {
        let summary = MatchVisualizer::new().summarize(25, 100);
        assert_eq!(summary, "25 of 100 reference features matched (25.0%)");
        assert!(MatchVisualizer::new().summarize(0, 0).contains("0.0%"));
    }

    #[test]
    fn threshold_bar_partial_and_full() {
        let visualizer = MatchVisualizer::default();
        let bar = visualizer.threshold_bar(5, 10);
        assert!(bar.contains("█████░░░░░"));
        assert!(bar.ends_with("5/10"));

        let full = visualizer.threshold_bar(50, 10);
        assert!(full.contains("██████████"));
    }
}
