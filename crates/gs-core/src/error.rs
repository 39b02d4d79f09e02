use thiserror::Error;

/// Terminal result of one conversion run: the rendered art, or why there is none.
pub type Outcome = Result<String, ConvertError>;

/// Errors originating from the core types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Sample buffer does not match the declared width/height.
    #[error("Dimensions invalides : {width}×{height} ({len} échantillons)")]
    InvalidDimensions {
        /// Width value.
        width: usize,
        /// Height value.
        height: usize,
        /// Number of samples actually supplied.
        len: usize,
    },
}

/// Reasons a conversion run ends without rendered art.
///
/// The display text of the first three variants is shown to the user verbatim.
///
/// # Example
/// ```
/// use gs_core::error::ConvertError;
/// assert_eq!(ConvertError::InvalidScaleFactor.to_string(), "Invalid scale factor.");
/// assert!(ConvertError::Cancelled.is_cancelled());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The request carried no image source.
    #[error("Please select an image")]
    NoInputSelected,

    /// Destination size exceeds the available display area while the size limit is on.
    #[error("Image is too large to be displayed on the screen\nTry increasing the scale factor.")]
    OutputTooLarge {
        /// Destination width in characters.
        width: usize,
        /// Destination height in characters.
        height: usize,
        /// Available width.
        max_width: usize,
        /// Available height.
        max_height: usize,
    },

    /// The scale factor is out of range or yields an empty destination.
    #[error("Invalid scale factor.")]
    InvalidScaleFactor,

    /// The raster could not be parsed.
    #[error("Malformed raster: {0}")]
    MalformedRaster(String),

    /// The raster could not be produced or opened.
    #[error("Raster unavailable: {0}")]
    RasterUnavailable(String),

    /// The run was cancelled on request. Not a failure.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConvertError {
    /// `true` for the cancellation outcome.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
