//! Image enhancement applied once before the recognition passes.
//!
//! Enhancement is a pure function of the input bytes. [`Passthrough`] is the default;
//! [`ContrastStretch`] (feature `preprocessing`) converts to grayscale and stretches the
//! luminance histogram, which helps with faded laminated cards.

use std::sync::Arc;

use crate::Result;

pub trait ImagePreprocessor: Send + Sync {
    fn name(&self) -> &str;

    fn preprocess(&self, image: Arc<[u8]>) -> Result<Arc<[u8]>>;
}

/// Returns the image unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ImagePreprocessor for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn preprocess(&self, image: Arc<[u8]>) -> Result<Arc<[u8]>> {
        Ok(image)
    }
}

#[cfg(feature = "preprocessing")]
pub use contrast::ContrastStretch;

#[cfg(feature = "preprocessing")]
mod contrast {
    use super::ImagePreprocessor;
    use crate::{LekhaError, Result};
    use image::{GrayImage, ImageFormat, ImageReader};
    use std::io::Cursor;
    use std::sync::Arc;

    /// Grayscale conversion followed by a linear stretch between two percentiles.
    #[derive(Debug, Clone, Copy)]
    pub struct ContrastStretch {
        /// Fraction of darkest and brightest pixels clipped before stretching.
        pub clip_fraction: f32,
    }

    impl Default for ContrastStretch {
        fn default() -> Self {
            Self { clip_fraction: 0.01 }
        }
    }

    impl ContrastStretch {
        fn bounds(&self, gray: &GrayImage) -> (u8, u8) {
            let mut histogram = [0u64; 256];
            for pixel in gray.pixels() {
                histogram[pixel.0[0] as usize] += 1;
            }

            let total: u64 = histogram.iter().sum();
            let clip = (total as f64 * self.clip_fraction.clamp(0.0, 0.49) as f64) as u64;

            let mut low = 0u8;
            let mut seen = 0u64;
            for (value, count) in histogram.iter().enumerate() {
                seen += count;
                if seen > clip {
                    low = value as u8;
                    break;
                }
            }

            let mut high = 255u8;
            seen = 0;
            for (value, count) in histogram.iter().enumerate().rev() {
                seen += count;
                if seen > clip {
                    high = value as u8;
                    break;
                }
            }

            (low, high)
        }

        pub(crate) fn stretch(&self, mut gray: GrayImage) -> GrayImage {
            let (low, high) = self.bounds(&gray);
            if high <= low {
                return gray;
            }

            let range = (high - low) as f32;
            for pixel in gray.pixels_mut() {
                let value = pixel.0[0].clamp(low, high);
                pixel.0[0] = (((value - low) as f32 / range) * 255.0).round() as u8;
            }
            gray
        }
    }

    impl ImagePreprocessor for ContrastStretch {
        fn name(&self) -> &str {
            "contrast-stretch"
        }

        fn preprocess(&self, image: Arc<[u8]>) -> Result<Arc<[u8]>> {
            let decoded = ImageReader::new(Cursor::new(&image[..]))
                .with_guessed_format()
                .map_err(|e| LekhaError::image_processing(format!("Failed to read image format: {}", e)))?
                .decode()
                .map_err(|e| LekhaError::image_processing(format!("Failed to decode image: {}", e)))?;

            let stretched = self.stretch(decoded.to_luma8());

            let mut encoded = Cursor::new(Vec::new());
            stretched
                .write_to(&mut encoded, ImageFormat::Png)
                .map_err(|e| LekhaError::image_processing(format!("Failed to encode image: {}", e)))?;

            tracing::debug!(
                width = stretched.width(),
                height = stretched.height(),
                bytes = encoded.get_ref().len(),
                "image preprocessed"
            );
            Ok(Arc::from(encoded.into_inner()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_returns_same_buffer() {
        let image: Arc<[u8]> = Arc::from(&b"bytes"[..]);
        let out = Passthrough.preprocess(Arc::clone(&image)).unwrap();
        assert!(Arc::ptr_eq(&image, &out));
    }

    #[cfg(feature = "preprocessing")]
    #[test]
    fn test_contrast_stretch_expands_range() {
        use image::{GrayImage, Luma};

        let mut gray = GrayImage::new(10, 10);
        for (i, pixel) in gray.pixels_mut().enumerate() {
            *pixel = Luma([100 + (i % 50) as u8]);
        }

        let stretched = ContrastStretch { clip_fraction: 0.0 }.stretch(gray);
        let values: Vec<u8> = stretched.pixels().map(|p| p.0[0]).collect();
        assert_eq!(*values.iter().min().unwrap(), 0);
        assert_eq!(*values.iter().max().unwrap(), 255);
    }

    #[cfg(feature = "preprocessing")]
    #[test]
    fn test_contrast_stretch_rejects_garbage() {
        let err = ContrastStretch::default().preprocess(Arc::from(&b"not an image"[..])).unwrap_err();
        assert!(matches!(err, crate::LekhaError::ImageProcessing { .. }));
    }
}
