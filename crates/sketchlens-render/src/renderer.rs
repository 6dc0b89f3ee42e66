//! Renderer trait abstraction.

use sketchlens_core::{AnnotationDocument, CanvasConfig, RasterFrame, Rgba};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Image decoding failed: {0}")]
    Decode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// The document to paint, in paint order.
    pub document: &'a AnnotationDocument,
    /// Output size in pixels.
    pub width: u32,
    pub height: u32,
    /// Background color.
    pub background_color: Rgba,
    /// Paint guides and other export-excluded objects.
    pub include_excluded: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a context matching what the canvas shows.
    pub fn new(document: &'a AnnotationDocument, config: &CanvasConfig) -> Self {
        Self {
            document,
            width: config.width,
            height: config.height,
            background_color: config.background_color,
            include_excluded: true,
        }
    }

    /// Set the output size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Rgba) -> Self {
        self.background_color = color;
        self
    }

    /// Skip objects flagged `excludeFromExport` (report views).
    pub fn exportable_only(mut self) -> Self {
        self.include_excluded = false;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Composite the context's document into a fresh frame.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<RasterFrame>;
}
