//! CPU compositor built on tiny-skia.

use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use kurbo::{BezPath, PathEl};
use sketchlens_core::objects::{CircleObject, LineObject, PathObject, RectObject};
use sketchlens_core::{RasterFrame, Rgba, VectorObject};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

/// Software renderer producing straight-alpha RGBA frames.
#[derive(Debug, Default)]
pub struct SkiaRenderer {
    objects_drawn: usize,
}

impl SkiaRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects painted by the last render.
    pub fn objects_drawn(&self) -> usize {
        self.objects_drawn
    }
}

impl Renderer for SkiaRenderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<RasterFrame> {
        let mut pixmap = Pixmap::new(ctx.width, ctx.height).ok_or_else(|| {
            RendererError::InitFailed(format!("cannot allocate {}x{} pixmap", ctx.width, ctx.height))
        })?;
        let bg = ctx.background_color;
        pixmap.fill(Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

        self.objects_drawn = 0;
        for object in ctx.document.iter() {
            if !ctx.include_excluded && !object.is_exportable() {
                continue;
            }
            if draw_object(&mut pixmap, object) {
                self.objects_drawn += 1;
            }
        }
        log::debug!(
            "rendered {} of {} objects at {}x{}",
            self.objects_drawn,
            ctx.document.len(),
            ctx.width,
            ctx.height
        );

        let pixels = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RasterFrame::new(ctx.width, ctx.height, pixels)
            .map_err(|e| RendererError::RenderFailed(e.to_string()))
    }
}

/// Paint one object. Returns false for objects that produce no geometry.
fn draw_object(pixmap: &mut Pixmap, object: &VectorObject) -> bool {
    let opacity = object_opacity(object);
    match object {
        VectorObject::Line(line) => draw_line(pixmap, line, opacity),
        VectorObject::Path(path) => draw_path(pixmap, path, opacity),
        VectorObject::Rect(rect) => draw_rect(pixmap, rect, opacity),
        VectorObject::Circle(circle) => draw_circle(pixmap, circle, opacity),
        // Nothing to paint for types we do not model.
        VectorObject::Other(_) => false,
    }
}

fn draw_line(pixmap: &mut Pixmap, line: &LineObject, opacity: f64) -> bool {
    let mut pb = PathBuilder::new();
    pb.move_to(line.x1 as f32, line.y1 as f32);
    pb.line_to(line.x2 as f32, line.y2 as f32);
    let Some(path) = pb.finish() else {
        return false;
    };
    stroke(pixmap, &path, &line.stroke_color, line.stroke_width, opacity);
    true
}

fn draw_path(pixmap: &mut Pixmap, object: &PathObject, opacity: f64) -> bool {
    let Some(path) = to_skia_path(&object.to_bez_path()) else {
        return false;
    };
    if let Some(fill) = &object.fill {
        fill_path(pixmap, &path, fill, opacity);
    }
    stroke(pixmap, &path, &object.stroke_color, object.stroke_width, opacity);
    true
}

fn draw_rect(pixmap: &mut Pixmap, rect: &RectObject, opacity: f64) -> bool {
    let b = rect.bounds();
    let Some(r) = tiny_skia::Rect::from_ltrb(b.x0 as f32, b.y0 as f32, b.x1 as f32, b.y1 as f32)
    else {
        return false;
    };
    let path = PathBuilder::from_rect(r);
    if let Some(fill) = &rect.fill {
        fill_path(pixmap, &path, fill, opacity);
    }
    stroke(pixmap, &path, &rect.stroke_color, rect.stroke_width, opacity);
    true
}

fn draw_circle(pixmap: &mut Pixmap, circle: &CircleObject, opacity: f64) -> bool {
    let c = circle.center();
    let Some(path) = PathBuilder::from_circle(c.x as f32, c.y as f32, circle.radius as f32) else {
        return false;
    };
    if let Some(fill) = &circle.fill {
        fill_path(pixmap, &path, fill, opacity);
    }
    stroke(pixmap, &path, &circle.stroke_color, circle.stroke_width, opacity);
    true
}

fn stroke(pixmap: &mut Pixmap, path: &tiny_skia::Path, color: &str, width: f64, opacity: f64) {
    if width <= 0.0 {
        return;
    }
    let paint = paint_for(parse_color(color).with_opacity(opacity));
    let stroke = Stroke {
        width: width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
}

fn fill_path(pixmap: &mut Pixmap, path: &tiny_skia::Path, color: &str, opacity: f64) {
    let Some(color) = Rgba::parse_css(color) else {
        log::debug!("skipping fill with unparsable color {color:?}");
        return;
    };
    let paint = paint_for(color.with_opacity(opacity));
    pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
}

fn paint_for(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Stroke colors fall back to black when unparsable.
fn parse_color(s: &str) -> Rgba {
    Rgba::parse_css(s).unwrap_or_else(|| {
        log::debug!("unparsable stroke color {s:?}, using black");
        Rgba::BLACK
    })
}

/// Object-level `opacity` attribute, 1.0 when absent.
fn object_opacity(object: &VectorObject) -> f64 {
    object
        .extra()
        .get("opacity")
        .and_then(|v| v.as_f64())
        .map_or(1.0, |o| o.clamp(0.0, 1.0))
}

fn to_skia_path(bez: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in bez.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}
