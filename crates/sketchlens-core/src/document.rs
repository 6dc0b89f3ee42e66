//! Annotation documents: ordered, versioned collections of vector objects.

use crate::objects::{ExtraFields, VectorObject};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Format version written into new documents.
pub const DEFAULT_FORMAT_VERSION: &str = "4.6.0";

fn default_format_version() -> String {
    DEFAULT_FORMAT_VERSION.to_string()
}

/// Document errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Malformed annotation document: {0}")]
    Malformed(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// An ordered collection of drawable objects plus a format version tag.
///
/// Object order is paint order: later objects paint over earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(rename = "version", default = "default_format_version")]
    pub format_version: String,
    pub objects: Vec<VectorObject>,
    /// Document-level keys this crate does not model.
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for AnnotationDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl AnnotationDocument {
    /// Create an empty document with the default format version.
    pub fn empty() -> Self {
        Self::with_objects(Vec::new())
    }

    /// Create a document holding `objects` with the default format version.
    pub fn with_objects(objects: Vec<VectorObject>) -> Self {
        Self {
            format_version: default_format_version(),
            objects,
            extra: ExtraFields::new(),
        }
    }

    /// Parse a document from JSON text.
    pub fn load(text: &str) -> DocumentResult<Self> {
        serde_json::from_str(text).map_err(|e| DocumentError::Malformed(e.to_string()))
    }

    /// Parse a document from uploaded bytes.
    pub fn load_bytes(bytes: &[u8]) -> DocumentResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| DocumentError::Malformed(format!("not UTF-8 text: {e}")))?;
        Self::load(text)
    }

    /// Append an object on top of the existing ones.
    pub fn push(&mut self, object: impl Into<VectorObject>) {
        self.objects.push(object.into());
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VectorObject> {
        self.objects.iter()
    }

    /// Objects that derived views should include, in paint order.
    pub fn exportable(&self) -> Vec<&VectorObject> {
        filter_exportable(self)
    }

    /// Owned copy holding only exportable objects.
    pub fn exportable_document(&self) -> Self {
        Self {
            format_version: self.format_version.clone(),
            objects: self.objects.iter().filter(|o| o.is_exportable()).cloned().collect(),
            extra: self.extra.clone(),
        }
    }

    /// Guide objects (e.g. grid lines), in paint order.
    pub fn guides(&self) -> impl Iterator<Item = &VectorObject> {
        self.objects.iter().filter(|o| o.is_guide())
    }

    /// Owned copy with every guide removed.
    pub fn without_guides(&self) -> Self {
        Self {
            format_version: self.format_version.clone(),
            objects: self.objects.iter().filter(|o| !o.is_guide()).cloned().collect(),
            extra: self.extra.clone(),
        }
    }

    /// Merge `other` after this document's objects.
    ///
    /// The newer format version wins; document-level keys from `self` take
    /// precedence, keys only present in `other` are added.
    pub fn merged_with(&self, other: &AnnotationDocument) -> Self {
        let format_version =
            if compare_versions(&other.format_version, &self.format_version) == Ordering::Greater {
                other.format_version.clone()
            } else {
                self.format_version.clone()
            };

        let mut objects = Vec::with_capacity(self.objects.len() + other.objects.len());
        objects.extend(self.objects.iter().cloned());
        objects.extend(other.objects.iter().cloned());

        let mut extra = self.extra.clone();
        for (key, value) in &other.extra {
            if !extra.contains_key(key) {
                extra.insert(key.clone(), value.clone());
            }
        }

        Self {
            format_version,
            objects,
            extra,
        }
    }

    /// Union of all object bounds, `None` when nothing has geometry.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .filter_map(VectorObject::bounds)
            .reduce(|acc, b| acc.union(b))
    }
}

/// Merge two optional documents.
///
/// A missing document is the identity; two missing documents give an empty
/// document. Inputs are never modified.
pub fn merge(
    first: Option<&AnnotationDocument>,
    second: Option<&AnnotationDocument>,
) -> AnnotationDocument {
    match (first, second) {
        (None, None) => AnnotationDocument::empty(),
        (Some(doc), None) | (None, Some(doc)) => doc.clone(),
        (Some(a), Some(b)) => a.merged_with(b),
    }
}

/// Objects with `excludeFromExport == false`, in paint order.
pub fn filter_exportable(doc: &AnnotationDocument) -> Vec<&VectorObject> {
    doc.objects.iter().filter(|o| o.is_exportable()).collect()
}

/// Compare dot-separated version strings.
///
/// Numeric components compare numerically, anything else lexically; a
/// version that is a strict prefix of another is older.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.trim().split('.');
    let mut right = b.trim().split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
