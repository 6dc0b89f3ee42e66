//! Canvas configuration.

use crate::color::Rgba;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use thiserror::Error;

/// Largest width or height a canvas may have.
pub const MAX_CANVAS_SIDE: u32 = 4096;

/// Smallest grid cell; finer grids drown the drawing in guides.
pub const MIN_GRID_SIZE: u32 = 10;

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Canvas dimensions must be positive, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("Canvas is limited to {MAX_CANVAS_SIDE}px per side, got {width}x{height}")]
    CanvasTooLarge { width: u32, height: u32 },
    #[error("Grid cell size must be at least {MIN_GRID_SIZE}px, got {0}")]
    CellSize(u32),
    #[error("Fill opacity must be within 0.0..=1.0, got {0}")]
    Opacity(f64),
    #[error("Stroke width must be positive, got {0}")]
    StrokeWidth(f64),
}

/// Per-session canvas settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub stroke_color: Rgba,
    pub stroke_width: f64,
    pub fill_color: Rgba,
    /// Fill opacity, 0.0 (invisible) to 1.0 (opaque).
    pub fill_opacity: f64,
    pub background_color: Rgba,
    pub show_grid: bool,
    /// Only meaningful when `show_grid` is on.
    pub grid_size: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 560,
            height: 360,
            stroke_color: Rgba::BLACK,
            stroke_width: 6.0,
            fill_color: Rgba::opaque(255, 165, 0),
            fill_opacity: 0.25,
            background_color: Rgba::WHITE,
            show_grid: false,
            grid_size: 30,
        }
    }
}

impl CanvasConfig {
    /// Set the canvas size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Turn the grid on with the given cell size.
    pub fn with_grid(mut self, grid_size: u32) -> Self {
        self.show_grid = true;
        self.grid_size = grid_size;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Rgba) -> Self {
        self.background_color = color;
        self
    }

    /// Set the stroke used for new freehand strokes.
    pub fn with_stroke(mut self, color: Rgba, width: f64) -> Self {
        self.stroke_color = color;
        self.stroke_width = width;
        self
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_CANVAS_SIDE || self.height > MAX_CANVAS_SIDE {
            return Err(ConfigError::CanvasTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        if self.show_grid && self.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::CellSize(self.grid_size));
        }
        if !(0.0..=1.0).contains(&self.fill_opacity) {
            return Err(ConfigError::Opacity(self.fill_opacity));
        }
        if !(self.stroke_width > 0.0 && self.stroke_width.is_finite()) {
            return Err(ConfigError::StrokeWidth(self.stroke_width));
        }
        Ok(())
    }

    /// Grid cell size when the grid is on.
    pub fn grid_cell(&self) -> Option<NonZeroU32> {
        if self.show_grid {
            NonZeroU32::new(self.grid_size)
        } else {
            None
        }
    }

    /// Fill color with opacity as a CSS `rgba(...)` string.
    pub fn fill_rgba(&self) -> String {
        self.fill_color.to_rgba_css(self.fill_opacity)
    }

    /// Check if switching to `other` invalidates the drawing surface.
    pub fn dimensions_differ(&self, other: &CanvasConfig) -> bool {
        self.width != other.width || self.height != other.height
    }
}
