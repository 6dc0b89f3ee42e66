//! Grid guide generation.

use crate::document::AnnotationDocument;
use crate::objects::{LineObject, ObjectFlags, VectorObject};
use std::num::NonZeroU32;

/// Default grid line color.
pub const DEFAULT_GRID_COLOR: &str = "#E6E6E6";

/// Stroke width of grid lines.
pub const GRID_STROKE_WIDTH: f64 = 1.0;

/// Generate grid guides for a `width` x `height` canvas.
///
/// One vertical line at every `x = 0, cell, 2*cell, ...` below `width`, then
/// one horizontal line at every `y` below `height`, each group ascending.
/// Every line is a guide: not selectable, not evented, excluded from export.
/// Cells larger than the canvas yield only the lines at 0.
pub fn generate_grid(
    width: u32,
    height: u32,
    cell_size: NonZeroU32,
    color: &str,
) -> AnnotationDocument {
    let step = cell_size.get() as usize;
    let (w, h) = (width as f64, height as f64);

    let guide = |x1: f64, y1: f64, x2: f64, y2: f64| -> VectorObject {
        LineObject::new(x1, y1, x2, y2, color, GRID_STROKE_WIDTH)
            .with_flags(ObjectFlags::guide())
            .into()
    };

    let verticals = (0..width).step_by(step).map(|x| guide(x as f64, 0.0, x as f64, h));
    let horizontals = (0..height).step_by(step).map(|y| guide(0.0, y as f64, w, y as f64));

    let objects: Vec<VectorObject> = verticals.chain(horizontals).collect();
    log::debug!(
        "generated {} grid lines for {}x{} canvas (cell {})",
        objects.len(),
        width,
        height,
        cell_size
    );
    AnnotationDocument::with_objects(objects)
}
