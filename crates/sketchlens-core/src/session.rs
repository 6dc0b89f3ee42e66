//! Per-session drawing state and the actions that mutate it.

use crate::config::{CanvasConfig, ConfigError};
use crate::document::{AnnotationDocument, DocumentResult, merge};
use crate::grid::{DEFAULT_GRID_COLOR, generate_grid};
use crate::objects::{PathObject, VectorObject, simplify_points};
use crate::report::AnalysisReport;
use crate::vector;
use kurbo::Point;

/// Pointer trails are simplified to this tolerance (pixels) before smoothing.
pub const FREEHAND_SIMPLIFY_TOLERANCE: f64 = 0.5;

/// Result of importing an uploaded annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The file parsed and its objects were appended.
    Merged { added: usize },
    /// The file was rejected; the document is unchanged.
    Rejected { warning: String },
}

/// One user's canvas: its configuration, live document and latest analysis.
///
/// The document's coordinates are relative to the canvas dimensions, so a
/// size change starts a fresh document.
#[derive(Debug, Clone)]
pub struct Session {
    config: CanvasConfig,
    document: AnnotationDocument,
    last_report: Option<AnalysisReport>,
}

impl Session {
    /// Create a session with an empty document (plus grid, if enabled).
    pub fn new(config: CanvasConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut session = Self {
            config,
            document: AnnotationDocument::empty(),
            last_report: None,
        };
        session.regrid();
        Ok(session)
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn document(&self) -> &AnnotationDocument {
        &self.document
    }

    pub fn last_report(&self) -> Option<&AnalysisReport> {
        self.last_report.as_ref()
    }

    /// Append a stroke or shape on top of the drawing.
    pub fn draw_stroke(&mut self, object: impl Into<VectorObject>) {
        self.document.push(object);
    }

    /// Turn pointer samples into a smoothed path using the current stroke.
    /// Returns false (and draws nothing) for an empty trail.
    pub fn draw_freehand(&mut self, points: &[Point]) -> bool {
        let points = simplify_points(points, FREEHAND_SIMPLIFY_TOLERANCE);
        let stroke = self.config.stroke_color.to_hex();
        match PathObject::freehand(&points, &stroke, self.config.stroke_width) {
            Some(path) => {
                self.document.push(path);
                true
            }
            None => false,
        }
    }

    /// Apply a new configuration.
    ///
    /// A dimension change discards the drawing; a grid change replaces the
    /// guides. Returns true when the document was discarded.
    pub fn update_config(&mut self, config: CanvasConfig) -> Result<bool, ConfigError> {
        config.validate()?;
        let resized = self.config.dimensions_differ(&config);
        let regrid = resized || self.config.grid_cell() != config.grid_cell();
        self.config = config;

        if resized {
            log::info!(
                "canvas resized to {}x{}, starting a new document",
                self.config.width,
                self.config.height
            );
            self.document = AnnotationDocument::empty();
        }
        if regrid {
            self.regrid();
        }
        Ok(resized)
    }

    /// Toggle the grid overlay.
    pub fn set_grid(&mut self, show: bool, grid_size: u32) -> Result<(), ConfigError> {
        let config = CanvasConfig {
            show_grid: show,
            grid_size,
            ..self.config.clone()
        };
        self.update_config(config).map(|_| ())
    }

    /// Change the canvas size. Returns true when the drawing was discarded.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<bool, ConfigError> {
        let config = self.config.clone().with_size(width, height);
        self.update_config(config)
    }

    /// Merge an uploaded annotation file onto the current drawing.
    ///
    /// Malformed input leaves the document untouched and is reported as a
    /// warning rather than an error.
    pub fn import_document(&mut self, bytes: &[u8]) -> ImportOutcome {
        match AnnotationDocument::load_bytes(bytes) {
            Ok(imported) => {
                let added = imported.len();
                self.document = merge(Some(&self.document), Some(&imported));
                log::info!("imported {added} objects");
                ImportOutcome::Merged { added }
            }
            Err(e) => {
                log::warn!("rejected annotation import: {e}");
                ImportOutcome::Rejected {
                    warning: e.to_string(),
                }
            }
        }
    }

    /// Remove every drawn object, keeping the grid.
    pub fn clear(&mut self) {
        self.document = AnnotationDocument::empty();
        self.regrid();
    }

    /// The live document as JSON text.
    pub fn export_json(&self) -> DocumentResult<String> {
        vector::serialize(&self.document)
    }

    /// Keep the latest analysis for report download.
    pub fn record_report(&mut self, report: AnalysisReport) {
        self.last_report = Some(report);
    }

    /// Drop existing guides and prepend a fresh grid when enabled.
    fn regrid(&mut self) {
        let content = self.document.without_guides();
        self.document = match self.config.grid_cell() {
            Some(cell) => generate_grid(
                self.config.width,
                self.config.height,
                cell,
                DEFAULT_GRID_COLOR,
            )
            .merged_with(&content),
            None => content,
        };
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            config: CanvasConfig::default(),
            document: AnnotationDocument::empty(),
            last_report: None,
        }
    }
}
