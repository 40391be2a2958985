//! Snapshot decoding with format-specific fast paths.
//!
//! Camera snapshots are almost always JPEG, so those go through zune-jpeg
//! (1.5-2x faster than the image crate). Anything else, or a JPEG that
//! zune-jpeg refuses, falls back to the image crate.

use crate::error::DecodeError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Container format sniffed from the leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Jpeg,
    Other,
}

impl SnapshotFormat {
    /// Detect format from magic bytes
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&JPEG_MAGIC) {
            Self::Jpeg
        } else {
            Self::Other
        }
    }
}

/// Fast image decoder that uses optimized decoders per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an encoded snapshot held in memory.
    ///
    /// Zero-length input and images without pixels are rejected rather than
    /// handed on as an empty raster.
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let image = match SnapshotFormat::sniff(bytes) {
            SnapshotFormat::Jpeg => {
                Self::decode_jpeg(bytes).or_else(|_| Self::decode_fallback(bytes))?
            }
            SnapshotFormat::Other => Self::decode_fallback(bytes)?,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::ZeroDimensions {
                width: image.width(),
                height: image.height(),
            });
        }

        Ok(image)
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder
            .decode()
            .map_err(|e| DecodeError::Malformed(format!("zune-jpeg decode failed: {:?}", e)))?;

        let info = decoder
            .info()
            .ok_or_else(|| DecodeError::Malformed("missing JPEG frame info".to_string()))?;

        let width = info.width as u32;
        let height = info.height as u32;

        let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

        let image = match out_colorspace {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        DecodeError::Malformed("RGB buffer size mismatch".to_string())
                    })?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        DecodeError::Malformed("RGBA buffer size mismatch".to_string())
                    })?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        DecodeError::Malformed("Luma buffer size mismatch".to_string())
                    })?;
                DynamicImage::ImageLuma8(buffer)
            }
            other => {
                return Err(DecodeError::Malformed(format!(
                    "unsupported JPEG colorspace {:?}",
                    other
                )))
            }
        };

        Ok(image)
    }

    fn decode_fallback(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        image::load_from_memory(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}
