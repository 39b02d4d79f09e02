use crate::error::CoreError;
use crate::ramp::SAMPLE_MAX;

/// Grille de luminance row-major, échantillons bornés à `[0, SAMPLE_MAX]`.
///
/// Every row has exactly `width` samples and there are exactly `height` rows.
/// Produced by the decoder, replaced (never mutated in place) by the resampler.
///
/// # Example
/// ```
/// use gs_core::grid::LuminanceGrid;
/// let grid = LuminanceGrid::from_raw(2, 2, vec![0, 10, 20, 30]).unwrap();
/// assert_eq!(grid.get(1, 0), 10);
/// assert_eq!(grid.rows().count(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LuminanceGrid {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl LuminanceGrid {
    /// Zero-filled grid.
    ///
    /// # Example
    /// ```
    /// use gs_core::grid::LuminanceGrid;
    /// let grid = LuminanceGrid::new(4, 3);
    /// assert_eq!(grid.as_slice().len(), 12);
    /// ```
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0u8; width * height],
            width,
            height,
        }
    }

    /// Wrap a row-major sample buffer. Samples above `SAMPLE_MAX` are saturated.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimensions` if `data.len() != width * height`.
    pub fn from_raw(width: usize, height: usize, mut data: Vec<u8>) -> Result<Self, CoreError> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(CoreError::InvalidDimensions {
                width,
                height,
                len: data.len(),
            });
        }
        for sample in &mut data {
            *sample = (*sample).min(SAMPLE_MAX);
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Width in samples.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample at column `x`, row `y`.
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < self.width && y < self.height, "sample out of bounds");
        self.data[y * self.width + x]
    }

    /// One row as a slice.
    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Rows in order. Yields nothing for a zero-width grid.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[u8]> {
        let rows = if self.width == 0 { 0 } else { self.height };
        (0..rows).map(move |y| self.row(y))
    }

    /// Flat row-major samples.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Flat row-major samples, mutable. Callers must keep samples within `SAMPLE_MAX`.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
