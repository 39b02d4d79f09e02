//! Raster acquisition, decoding, and resampling for grayscii.

pub mod magick;
pub mod passthrough;
pub mod pgm;
pub mod resize;

#[cfg(feature = "native")]
pub mod native;
