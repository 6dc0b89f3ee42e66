//! SketchLens Core Library
//!
//! Annotation documents for the SketchLens drawing board: the vector object
//! model, grid guides, JSON and PNG codecs, analysis prompts and the
//! per-session canvas state.

pub mod color;
pub mod config;
pub mod document;
pub mod grid;
pub mod objects;
pub mod prompt;
pub mod raster;
pub mod report;
pub mod session;
pub mod vector;

pub use color::Rgba;
pub use config::{CanvasConfig, ConfigError, MAX_CANVAS_SIDE, MIN_GRID_SIZE};
pub use document::{AnnotationDocument, DocumentError, filter_exportable, merge};
pub use grid::{DEFAULT_GRID_COLOR, generate_grid};
pub use objects::{ObjectFlags, VectorObject};
pub use prompt::{DetailLevel, Language, PromptError, PromptSelection, PromptStyle, compose_prompt};
pub use raster::{RasterError, RasterFrame, decode_frame, encode_png};
pub use report::AnalysisReport;
pub use session::{ImportOutcome, Session};

/// Re-exported so callers can build pointer samples without naming kurbo.
pub use kurbo::Point;
