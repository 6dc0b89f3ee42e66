//! Reference images shown next to the canvas.

use crate::renderer::{RenderResult, RendererError};
use image::ImageReader;
use sketchlens_core::RasterFrame;
use std::io::Cursor;

/// Upper bound on either side of an uploaded reference image.
pub const MAX_REFERENCE_SIDE: u32 = 4096;

/// Decode an uploaded PNG, JPEG or WebP image into an RGBA frame.
pub fn decode_reference_image(bytes: &[u8]) -> RenderResult<RasterFrame> {
    let format = image::guess_format(bytes).map_err(|e| RendererError::Decode(e.to_string()))?;

    // Header dimensions are checked before any pixels are allocated.
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| RendererError::Decode(e.to_string()))?;
    if width > MAX_REFERENCE_SIDE || height > MAX_REFERENCE_SIDE {
        return Err(RendererError::Decode(format!(
            "{width}x{height} exceeds the {MAX_REFERENCE_SIDE}px limit"
        )));
    }

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| RendererError::Decode(e.to_string()))?;
    log::debug!("decoded {format:?} reference image {width}x{height}");

    RasterFrame::new(width, height, img.to_rgba8().into_raw())
        .map_err(|e| RendererError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchlens_core::encode_png;

    #[test]
    fn test_decode_png_reference() {
        let frame = RasterFrame::filled(3, 2, [9, 8, 7, 255]);
        let png = encode_png(&frame).unwrap();
        assert_eq!(decode_reference_image(&png).unwrap(), frame);
    }

    #[test]
    fn test_decode_jpeg_reference() {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 200, 200]));
        let mut jpeg = std::io::Cursor::new(Vec::new());
        img.write_to(&mut jpeg, image::ImageFormat::Jpeg).unwrap();

        let frame = decode_reference_image(jpeg.get_ref()).unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 4));
        assert_eq!(frame.pixel(0, 0).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_oversized_reference_rejected() {
        let frame = RasterFrame::filled(MAX_REFERENCE_SIDE + 1, 1, [0, 0, 0, 255]);
        let png = encode_png(&frame).unwrap();
        let err = decode_reference_image(&png).unwrap_err();
        assert!(err.to_string().contains("4096px"));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_reference_image(b"definitely not an image"),
            Err(RendererError::Decode(_))
        ));
    }
}
