//! Types, configuration, and shared contracts for grayscii.
//!
//! This crate contains the luminance grid, the glyph ramp, the request and
//! error types, and the traits that connect the conversion pipeline to its
//! collaborators.

pub mod config;
pub mod error;
pub mod grid;
pub mod ramp;
pub mod request;
pub mod traits;

pub use config::{AppConfig, ConversionConfig};
pub use error::{ConvertError, CoreError, Outcome};
pub use grid::LuminanceGrid;
pub use ramp::GlyphRamp;
pub use request::{ConversionRequest, DisplayBounds};
