//! Objects of a type this crate does not model.

use super::{ExtraFields, ObjectFlags};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An object kept as its raw key/value map, `type` included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueObject {
    fields: ExtraFields,
}

impl OpaqueObject {
    pub(crate) fn from_fields(fields: ExtraFields) -> Self {
        Self { fields }
    }

    pub fn kind(&self) -> &str {
        self.fields.get("type").and_then(Value::as_str).unwrap_or("")
    }

    pub fn fields(&self) -> &ExtraFields {
        &self.fields
    }

    /// Flags read from the raw map, defaulting like known objects do.
    pub fn flags(&self) -> ObjectFlags {
        let defaults = ObjectFlags::default();
        let flag = |key: &str, default: bool| {
            self.fields.get(key).and_then(Value::as_bool).unwrap_or(default)
        };
        ObjectFlags {
            selectable: flag("selectable", defaults.selectable),
            evented: flag("evented", defaults.evented),
            exclude_from_export: flag("excludeFromExport", defaults.exclude_from_export),
        }
    }

    pub fn set_flags(&mut self, flags: ObjectFlags) {
        self.fields.insert("selectable".into(), Value::Bool(flags.selectable));
        self.fields.insert("evented".into(), Value::Bool(flags.evented));
        self.fields
            .insert("excludeFromExport".into(), Value::Bool(flags.exclude_from_export));
    }
}
