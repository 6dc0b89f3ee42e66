//! Freehand path object.

use super::{ExtraFields, ObjectFlags, default_stroke, default_stroke_width};
use kurbo::{BezPath, Point, Rect, Shape as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One path command, serialized as `["M", x, y]`, `["Q", cx, cy, x, y]`, ...
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Close,
}

impl PathCommand {
    fn letter(&self) -> &'static str {
        match self {
            PathCommand::MoveTo(_) => "M",
            PathCommand::LineTo(_) => "L",
            PathCommand::QuadTo(..) => "Q",
            PathCommand::CubicTo(..) => "C",
            PathCommand::Close => "Z",
        }
    }

    fn points(&self) -> Vec<Point> {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => vec![p],
            PathCommand::QuadTo(c, p) => vec![c, p],
            PathCommand::CubicTo(c1, c2, p) => vec![c1, c2, p],
            PathCommand::Close => Vec::new(),
        }
    }
}

impl TryFrom<Vec<Value>> for PathCommand {
    type Error = String;

    fn try_from(items: Vec<Value>) -> Result<Self, Self::Error> {
        let (letter, coords) = items
            .split_first()
            .ok_or_else(|| "empty path command".to_string())?;
        let letter = letter
            .as_str()
            .ok_or_else(|| format!("path command must start with a letter, found {letter}"))?;
        let coords = coords
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| format!("non-numeric path coordinate {v}")))
            .collect::<Result<Vec<f64>, String>>()?;
        let expected = match letter {
            "M" | "L" => 2,
            "Q" => 4,
            "C" => 6,
            "Z" | "z" => 0,
            other => return Err(format!("unsupported path command {other:?}")),
        };
        if coords.len() != expected {
            return Err(format!(
                "path command {letter:?} takes {expected} coordinates, found {}",
                coords.len()
            ));
        }
        let p = |i: usize| Point::new(coords[i], coords[i + 1]);
        Ok(match letter {
            "M" => PathCommand::MoveTo(p(0)),
            "L" => PathCommand::LineTo(p(0)),
            "Q" => PathCommand::QuadTo(p(0), p(2)),
            "C" => PathCommand::CubicTo(p(0), p(2), p(4)),
            _ => PathCommand::Close,
        })
    }
}

impl From<PathCommand> for Vec<Value> {
    fn from(command: PathCommand) -> Self {
        let mut items = vec![Value::from(command.letter())];
        for point in command.points() {
            items.push(Value::from(point.x));
            items.push(Value::from(point.y));
        }
        items
    }
}

/// A freehand stroke made of path commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathObject {
    pub path: Vec<PathCommand>,
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

impl PathObject {
    pub fn new(path: Vec<PathCommand>, stroke_color: &str, stroke_width: f64) -> Self {
        Self {
            path,
            stroke_color: stroke_color.to_string(),
            stroke_width,
            fill: None,
            flags: ObjectFlags::default(),
            extra: ExtraFields::new(),
        }
    }

    /// Build a smoothed freehand stroke from pointer samples.
    ///
    /// Each sample becomes the control point of a quadratic segment ending at
    /// the midpoint to the next sample, and the stroke finishes with a
    /// straight segment to the last sample. Returns `None` for no samples.
    pub fn freehand(points: &[Point], stroke_color: &str, stroke_width: f64) -> Option<Self> {
        let (&first, _) = points.split_first()?;
        let mut path = vec![PathCommand::MoveTo(first)];
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                continue;
            }
            path.push(PathCommand::QuadTo(a, a.midpoint(b)));
        }
        let last = points[points.len() - 1];
        path.push(PathCommand::LineTo(last));
        Some(Self::new(path, stroke_color, stroke_width))
    }

    /// Convert to a kurbo path.
    pub fn to_bez_path(&self) -> BezPath {
        let mut bez = BezPath::new();
        for command in &self.path {
            match *command {
                PathCommand::MoveTo(p) => bez.move_to(p),
                PathCommand::LineTo(p) => bez.line_to(p),
                PathCommand::QuadTo(c, p) => bez.quad_to(c, p),
                PathCommand::CubicTo(c1, c2, p) => bez.curve_to(c1, c2, p),
                PathCommand::Close => bez.close_path(),
            }
        }
        bez
    }

    /// Bounds of the drawn geometry, `None` for an empty path.
    pub fn bounds(&self) -> Option<Rect> {
        if self.path.is_empty() {
            return None;
        }
        Some(self.to_bez_path().bounding_box())
    }
}

/// Ramer-Douglas-Peucker simplification of a pointer trail.
///
/// Spans still to be examined live on an explicit stack, so stack depth stays
/// constant however the trail zigzags. Endpoints are always kept.
pub fn simplify_points(points: &[Point], tolerance: f64) -> Vec<Point> {
    let Some(last) = points.len().checked_sub(1) else {
        return Vec::new();
    };
    if last < 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut spans = vec![(0, last)];
    while let Some((start, end)) = spans.pop() {
        let (a, b) = (points[start], points[end]);
        let mut split = None;
        let mut widest = tolerance;
        for (i, &p) in points.iter().enumerate().take(end).skip(start + 1) {
            let offset = distance_to_chord(p, a, b);
            if offset > widest {
                widest = offset;
                split = Some(i);
            }
        }
        if let Some(mid) = split {
            keep[mid] = true;
            if mid - start > 1 {
                spans.push((start, mid));
            }
            if end - mid > 1 {
                spans.push((mid, end));
            }
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Distance from `p` to the line through `a` and `b`; to `a` when they coincide.
fn distance_to_chord(p: Point, a: Point, b: Point) -> f64 {
    let chord = b - a;
    let length = chord.hypot();
    if length < f64::EPSILON {
        return p.distance(a);
    }
    (p - a).cross(chord).abs() / length
}
