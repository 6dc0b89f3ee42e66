//! Axis-aligned rectangle object.

use super::{ExtraFields, ObjectFlags, default_stroke, default_stroke_width};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// A rectangle anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectObject {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "stroke", default = "default_stroke")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    /// Fill color as a CSS color string (None = no fill).
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(flatten)]
    pub flags: ObjectFlags,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl RectObject {
    pub fn new(left: f64, top: f64, width: f64, height: f64, stroke_color: &str, stroke_width: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            stroke_color: stroke_color.to_string(),
            stroke_width,
            fill: None,
            flags: ObjectFlags::default(),
            extra: ExtraFields::new(),
        }
    }

    pub fn with_fill(mut self, fill: &str) -> Self {
        self.fill = Some(fill.to_string());
        self
    }

    /// Bounds, normalized for negative width/height.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.left, self.top, self.left + self.width, self.top + self.height).abs()
    }
}
