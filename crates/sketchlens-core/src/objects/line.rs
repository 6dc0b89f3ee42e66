//! Straight line object.

use super::{ExtraFields, ObjectFlags, default_stroke, default_stroke_width};
use kurbo::{Line as KurboLine, Point, Rect};
use serde::{Deserialize, Serialize};

/// A straight segment from `(x1, y1)` to `(x2, y2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineObject {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Stroke color as a CSS color string.
    #[serde(rename = "stroke", default = "default_stroke")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(flatten)]
    pub flags: ObjectFlags,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl LineObject {
    /// Create a new interactive, exportable line.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, stroke_color: &str, stroke_width: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            stroke_color: stroke_color.to_string(),
            stroke_width,
            flags: ObjectFlags::default(),
            extra: ExtraFields::new(),
        }
    }

    /// Replace the interaction/export flags.
    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        self.as_kurbo().length()
    }

    /// Get as a kurbo Line.
    pub fn as_kurbo(&self) -> KurboLine {
        KurboLine::new(self.start(), self.end())
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    /// Check if the line is axis-aligned vertically.
    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }

    /// Check if the line is axis-aligned horizontally.
    pub fn is_horizontal(&self) -> bool {
        self.y1 == self.y2
    }
}
