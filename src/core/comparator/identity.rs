//! Exact pixel equality between two decoded images.

use image::DynamicImage;

/// Per-channel count of samples that differ between two images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelDifference {
    pub per_channel: Vec<usize>,
}

impl PixelDifference {
    /// True when no sample differs in any channel
    pub fn is_identical(&self) -> bool {
        self.per_channel.iter().all(|&count| count == 0)
    }

    /// Total number of differing samples
    pub fn total(&self) -> usize {
        self.per_channel.iter().sum()
    }
}

/// Count differing samples per channel.
///
/// Returns `None` when the images differ in width, height or color type,
/// since they cannot be compared sample by sample.
pub fn pixel_difference(a: &DynamicImage, b: &DynamicImage) -> Option<PixelDifference> {
    if a.width() != b.width() || a.height() != b.height() || a.color() != b.color() {
        return None;
    }

    let color = a.color();
    let channels = color.channel_count() as usize;
    let bytes_per_sample = (color.bytes_per_pixel() as usize / channels).max(1);

    let mut per_channel = vec![0usize; channels];
    let samples_a = a.as_bytes().chunks_exact(bytes_per_sample);
    let samples_b = b.as_bytes().chunks_exact(bytes_per_sample);
    for (index, (sa, sb)) in samples_a.zip(samples_b).enumerate() {
        if sa != sb {
            per_channel[index % channels] += 1;
        }
    }

    Some(PixelDifference { per_channel })
}
