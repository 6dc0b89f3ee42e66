//! Circle object.

use super::{ExtraFields, ObjectFlags, default_stroke, default_stroke_width};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A circle described by the top-left corner of its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleObject {
    pub left: f64,
    pub top: f64,
    pub radius: f64,
    #[serde(rename = "stroke", default = "default_stroke")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(flatten)]
    pub flags: ObjectFlags,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CircleObject {
    /// Create a circle from its center and radius.
    pub fn from_center(center: Point, radius: f64, stroke_color: &str, stroke_width: f64) -> Self {
        let radius = radius.abs();
        Self {
            left: center.x - radius,
            top: center.y - radius,
            radius,
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

    pub fn center(&self) -> Point {
        Point::new(self.left + self.radius, self.top + self.radius)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + 2.0 * self.radius,
            self.top + 2.0 * self.radius,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_round_trip() {
        let circle = CircleObject::from_center(Point::new(50.0, 40.0), 10.0, "#000", 2.0);
        assert_eq!(circle.left, 40.0);
        assert_eq!(circle.top, 30.0);
        assert_eq!(circle.center(), Point::new(50.0, 40.0));
        assert_eq!(circle.bounds(), Rect::new(40.0, 30.0, 60.0, 50.0));
    }
}
