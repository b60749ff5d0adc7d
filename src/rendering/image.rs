use crate::Result;
use image::RgbaImage;

/// A fetched tile image, or a placeholder for one still in flight
#[derive(Debug, Clone)]
pub struct TileImage {
    src: String,
    pixels: Option<RgbaImage>,
}

impl TileImage {
    pub fn new(src: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            src: src.into(),
            pixels: Some(pixels),
        }
    }

    /// An image that has not finished loading
    pub fn pending(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            pixels: None,
        }
    }

    /// Decodes encoded image bytes (PNG or JPEG)
    pub fn decode(src: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::new(src, pixels))
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_complete(&self) -> bool {
        self.pixels.is_some()
    }

    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.width())
    }

    pub fn height(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn test_decode_png() {
        let source = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        source.write_to(&mut bytes, ImageOutputFormat::Png).unwrap();

        let image = TileImage::decode("t/0/0_0.png", bytes.get_ref()).unwrap();
        assert!(image.is_complete());
        assert_eq!((image.width(), image.height()), (4, 3));
        assert_eq!(image.pixels().unwrap().get_pixel(2, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            TileImage::decode("x", b"not an image"),
            Err(crate::Error::Decode(_))
        ));
    }

    #[test]
    fn test_pending() {
        let image = TileImage::pending("t/1/0_0.png");
        assert!(!image.is_complete());
        assert_eq!(image.width(), 0);
        assert_eq!(image.src(), "t/1/0_0.png");
    }
}
