//! Raster frames and PNG encoding.
//!
//! Everything here works in memory: frames are encoded straight to bytes
//! (and base64 for the analysis upload) without touching the filesystem.

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

/// MIME type of exported rasters.
pub const PNG_MIME: &str = "image/png";

/// Suggested download name for exported rasters.
pub const PNG_FILE_NAME: &str = "sketch.png";

/// Raster errors.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("PNG encoding failed: {0}")]
    Encoding(String),
    #[error("PNG decoding failed: {0}")]
    Decoding(String),
}

/// Result type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// A composited canvas view: `width * height` straight-alpha RGBA8 samples,
/// row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterFrame {
    /// Wrap an RGBA8 buffer, checking its length against the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> RasterResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RasterError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let pixels = rgba.iter().copied().cycle().take(count * 4).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    /// RGBA sample at `(x, y)`, `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        let p = &self.pixels[i..i + 4];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Overwrite the sample at `(x, y)`. Returns false outside the frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.pixels[i..i + 4].copy_from_slice(&rgba);
                true
            }
            None => false,
        }
    }
}

/// Encode a frame as an 8-bit RGBA PNG.
pub fn encode_png(frame: &RasterFrame) -> RasterResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RasterError::Encoding(format!("header: {e}")))?;
        writer
            .write_image_data(&frame.pixels)
            .map_err(|e| RasterError::Encoding(format!("image data: {e}")))?;
        writer
            .finish()
            .map_err(|e| RasterError::Encoding(format!("finish: {e}")))?;
    }
    log::debug!(
        "encoded {}x{} frame to {} PNG bytes",
        frame.width,
        frame.height,
        png_data.len()
    );
    Ok(png_data)
}

/// Decode PNG bytes into an RGBA8 frame.
///
/// Palette, grayscale and 16-bit images are normalized to 8-bit RGBA.
pub fn decode_frame(bytes: &[u8]) -> RasterResult<RasterFrame> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| RasterError::Decoding(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| RasterError::Decoding(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let pixels = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(RasterError::Decoding(
                "palette image was not expanded".to_string(),
            ));
        }
    };

    RasterFrame::new(info.width, info.height, pixels)
}

/// PNG-encode a frame and return it as standard base64.
pub fn encode_png_base64(frame: &RasterFrame) -> RasterResult<String> {
    Ok(STANDARD.encode(encode_png(frame)?))
}

/// `data:image/png;base64,...` URL for a frame.
pub fn png_data_url(frame: &RasterFrame) -> RasterResult<String> {
    Ok(format!("data:{PNG_MIME};base64,{}", encode_png_base64(frame)?))
}
