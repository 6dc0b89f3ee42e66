//! Drawable vector objects stored in an annotation document.
//!
//! Objects use the drawing surface's JSON layout: a `type` tag, geometry
//! and style keys in camelCase, and three interaction flags. Keys this crate
//! does not model are kept in an `extra` map and written back unchanged, so
//! documents produced by newer tools survive a load/save cycle.

mod circle;
mod line;
mod opaque;
mod path;
mod rect;

pub use circle::CircleObject;
pub use line::LineObject;
pub use opaque::OpaqueObject;
pub use path::{PathCommand, PathObject, simplify_points};
pub use rect::RectObject;

use kurbo::Rect;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Unrecognized keys carried along with an object.
pub type ExtraFields = serde_json::Map<String, Value>;

/// Default stroke color for objects that omit one.
pub(crate) fn default_stroke() -> String {
    "#000000".to_string()
}

pub(crate) fn default_stroke_width() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Interaction and export flags shared by every object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFlags {
    /// Whether the object can be selected on the surface.
    #[serde(default = "default_true")]
    pub selectable: bool,
    /// Whether the object takes part in hit-testing.
    #[serde(default = "default_true")]
    pub evented: bool,
    /// Whether derived views (vector/report exports) skip the object.
    #[serde(default)]
    pub exclude_from_export: bool,
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self {
            selectable: true,
            evented: true,
            exclude_from_export: false,
        }
    }
}

impl ObjectFlags {
    /// Flags for drawing guides: visible, inert, never exported.
    pub fn guide() -> Self {
        Self {
            selectable: false,
            evented: false,
            exclude_from_export: true,
        }
    }

    /// Check if these flags describe a guide.
    pub fn is_guide(&self) -> bool {
        !self.selectable && !self.evented && self.exclude_from_export
    }
}

/// A drawable primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorObject {
    Line(LineObject),
    Path(PathObject),
    Rect(RectObject),
    Circle(CircleObject),
    /// An object whose `type` this crate does not know; kept verbatim.
    Other(OpaqueObject),
}

impl VectorObject {
    /// The wire `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            VectorObject::Line(_) => "line",
            VectorObject::Path(_) => "path",
            VectorObject::Rect(_) => "rect",
            VectorObject::Circle(_) => "circle",
            VectorObject::Other(o) => o.kind(),
        }
    }

    pub fn flags(&self) -> ObjectFlags {
        match self {
            VectorObject::Line(o) => o.flags,
            VectorObject::Path(o) => o.flags,
            VectorObject::Rect(o) => o.flags,
            VectorObject::Circle(o) => o.flags,
            VectorObject::Other(o) => o.flags(),
        }
    }

    pub fn set_flags(&mut self, flags: ObjectFlags) {
        match self {
            VectorObject::Line(o) => o.flags = flags,
            VectorObject::Path(o) => o.flags = flags,
            VectorObject::Rect(o) => o.flags = flags,
            VectorObject::Circle(o) => o.flags = flags,
            VectorObject::Other(o) => o.set_flags(flags),
        }
    }

    /// Check if derived views should include this object.
    pub fn is_exportable(&self) -> bool {
        !self.flags().exclude_from_export
    }

    /// Check if this object is a drawing guide (e.g. a grid line).
    pub fn is_guide(&self) -> bool {
        self.flags().is_guide()
    }

    /// Unrecognized keys carried by this object.
    pub fn extra(&self) -> &ExtraFields {
        match self {
            VectorObject::Line(o) => &o.extra,
            VectorObject::Path(o) => &o.extra,
            VectorObject::Rect(o) => &o.extra,
            VectorObject::Circle(o) => &o.extra,
            VectorObject::Other(o) => o.fields(),
        }
    }

    /// Geometric bounds, or `None` for objects without known geometry.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            VectorObject::Line(o) => Some(o.bounds()),
            VectorObject::Path(o) => o.bounds(),
            VectorObject::Rect(o) => Some(o.bounds()),
            VectorObject::Circle(o) => Some(o.bounds()),
            VectorObject::Other(_) => None,
        }
    }
}

impl From<LineObject> for VectorObject {
    fn from(object: LineObject) -> Self {
        VectorObject::Line(object)
    }
}

impl From<PathObject> for VectorObject {
    fn from(object: PathObject) -> Self {
        VectorObject::Path(object)
    }
}

impl From<RectObject> for VectorObject {
    fn from(object: RectObject) -> Self {
        VectorObject::Rect(object)
    }
}

impl From<CircleObject> for VectorObject {
    fn from(object: CircleObject) -> Self {
        VectorObject::Circle(object)
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TaggedRef<'a> {
    Line(&'a LineObject),
    Path(&'a PathObject),
    Rect(&'a RectObject),
    Circle(&'a CircleObject),
}

impl Serialize for VectorObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VectorObject::Line(o) => TaggedRef::Line(o).serialize(serializer),
            VectorObject::Path(o) => TaggedRef::Path(o).serialize(serializer),
            VectorObject::Rect(o) => TaggedRef::Rect(o).serialize(serializer),
            VectorObject::Circle(o) => TaggedRef::Circle(o).serialize(serializer),
            VectorObject::Other(o) => o.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for VectorObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = ExtraFields::deserialize(deserializer)?;
        let kind = match fields.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "object `type` must be a string, found {other}"
                )));
            }
            None => return Err(D::Error::missing_field("type")),
        };

        fn known<T, E>(mut fields: ExtraFields) -> Result<T, E>
        where
            T: serde::de::DeserializeOwned,
            E: serde::de::Error,
        {
            fields.remove("type");
            serde_json::from_value(Value::Object(fields)).map_err(E::custom)
        }

        match kind.as_str() {
            "line" => known(fields).map(VectorObject::Line),
            "path" => known(fields).map(VectorObject::Path),
            "rect" => known(fields).map(VectorObject::Rect),
            "circle" => known(fields).map(VectorObject::Circle),
            _ => {
                log::debug!("keeping object of unknown type {kind:?} verbatim");
                fields.insert("type".to_string(), Value::String(kind));
                Ok(VectorObject::Other(OpaqueObject::from_fields(fields)))
            }
        }
    }
}
