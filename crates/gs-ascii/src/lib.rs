//! Text rendering for grayscii.
//!
//! Maps every luminance sample through the glyph ramp, row-major,
//! one `\n`-terminated line per grid row.
pub mod render;

pub use render::{TextRenderer, render_text};
