//! Turning downloaded icon bytes into pixels.

use std::sync::Arc;

use bytes::Bytes;
use image::RgbaImage;

use crate::error::ResolveError;

/// Decodes encoded image bytes.
///
/// Failures should be reported as [`ResolveError::Decode`].
pub trait ImageDecoder: Send + Sync + 'static {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, ResolveError>;
}

/// Decodes any raster format the `image` crate recognizes (PNG, JPEG, GIF,
/// BMP, ICO, ...) into RGBA8.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, ResolveError> {
        let image = image::load_from_memory(bytes)?;
        Ok(image.to_rgba8())
    }
}

/// A resolved application icon.
///
/// Cloning is cheap; the pixel buffer is shared.
#[derive(Debug, Clone)]
pub struct Icon {
    image: Arc<RgbaImage>,
    bytes: Bytes,
    from_cache: bool,
}

impl Icon {
    pub(crate) fn new(image: RgbaImage, bytes: Bytes, from_cache: bool) -> Self {
        Self {
            image: Arc::new(image),
            bytes,
            from_cache,
        }
    }

    /// The decoded RGBA pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Shared handle to the decoded pixels.
    pub fn image_arc(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.image)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The encoded bytes exactly as downloaded.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Whether this icon came from the on-disk cache rather than the network.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let decoded = RasterDecoder.decode(&png(29, 29)).unwrap();
        assert_eq!(decoded.dimensions(), (29, 29));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_decode_garbage() {
        let err = RasterDecoder.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ResolveError::Decode(_)));
    }

    #[test]
    fn test_icon_accessors() {
        let bytes = Bytes::from(png(2, 3));
        let icon = Icon::new(RasterDecoder.decode(&bytes).unwrap(), bytes.clone(), true);

        assert_eq!(icon.width(), 2);
        assert_eq!(icon.height(), 3);
        assert_eq!(icon.bytes(), &bytes);
        assert!(icon.from_cache());
        assert!(Arc::ptr_eq(&icon.image_arc(), &icon.clone().image_arc()));
    }
}
