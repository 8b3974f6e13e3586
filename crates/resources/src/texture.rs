//! Texture image decoding.

use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use crate::error::{ResourceError, ResourceResult};

/// Decoded image as tightly packed RGBA8 rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Decodes the image at `path`, adding an opaque alpha channel when the
    /// file has none.
    pub fn load_rgba8(path: &Path) -> ResourceResult<Self> {
        if !path.exists() {
            return Err(ResourceError::FileNotFound(path.to_path_buf()));
        }

        let data = Self::from_dynamic(image::open(path)?);
        debug!(
            "Decoded {} ({}x{})",
            path.display(),
            data.width,
            data.height
        );
        Ok(data)
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    #[test]
    fn test_rgb_gains_opaque_alpha() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let data = ImageData::from_dynamic(DynamicImage::ImageRgb8(rgb));

        assert_eq!((data.width, data.height), (3, 2));
        assert_eq!(data.byte_len(), 3 * 2 * 4);
        assert_eq!(&data.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_png_round_trip_through_decoder() {
        let rgb = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        let data = ImageData::from_dynamic(decoded);
        assert_eq!(data.byte_len(), 64);
        assert!(data.pixels.chunks_exact(4).all(|p| p == [200, 100, 50, 255]));
    }

    #[test]
    fn test_missing_file() {
        let err = ImageData::load_rgba8(Path::new("no/such/texture.png")).unwrap_err();
        assert!(matches!(err, ResourceError::FileNotFound(_)));
    }
}
