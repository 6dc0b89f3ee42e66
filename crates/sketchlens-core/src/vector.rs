//! JSON export/import of annotation documents.

use crate::document::{AnnotationDocument, DocumentError, DocumentResult};

/// MIME type of exported documents.
pub const JSON_MIME: &str = "application/json";

/// Suggested download name for exported documents.
pub const JSON_FILE_NAME: &str = "annotations.json";

/// Serialize a document as pretty-printed JSON.
///
/// Object order and unrecognized keys are preserved; non-ASCII text is
/// written as-is.
pub fn serialize(doc: &AnnotationDocument) -> DocumentResult<String> {
    serde_json::to_string_pretty(doc).map_err(|e| DocumentError::Serialize(e.to_string()))
}

/// Parse a document previously produced by [`serialize`] (or by the drawing
/// surface).
pub fn deserialize(text: &str) -> DocumentResult<AnnotationDocument> {
    AnnotationDocument::load(text)
}
