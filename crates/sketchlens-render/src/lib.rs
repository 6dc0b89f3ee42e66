//! SketchLens Render Library
//!
//! Renderer abstraction and a tiny-skia CPU compositor that turns a
//! session's document into the raster frame used for PNG export and
//! analysis uploads.

mod reference;
mod renderer;
mod skia;

pub use reference::{MAX_REFERENCE_SIDE, decode_reference_image};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use skia::SkiaRenderer;

use sketchlens_core::{RasterFrame, Session};

/// Composite what the session's canvas currently shows.
pub fn render_session(session: &Session) -> RenderResult<RasterFrame> {
    let ctx = RenderContext::new(session.document(), session.config());
    SkiaRenderer::new().render(&ctx)
}
