use std::path::PathBuf;

use crate::config::ConversionConfig;

/// Zone d'affichage disponible pour le texte rendu, en caractères.
///
/// # Example
/// ```
/// use gs_core::request::DisplayBounds;
/// let screen = DisplayBounds::screen(1920, 1080);
/// assert_eq!(screen.available(), (1870, 800));
/// let term = DisplayBounds::terminal(120, 40);
/// assert!(term.fits(120, 40));
/// assert!(!term.fits(121, 40));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayBounds {
    /// Raw display width.
    pub width: u32,
    /// Raw display height.
    pub height: u32,
    /// Horizontal space reserved for surrounding chrome.
    pub margin_width: u32,
    /// Vertical space reserved for surrounding chrome.
    pub margin_height: u32,
}

impl DisplayBounds {
    /// Horizontal margin reserved around the text view of a windowed front end.
    pub const SCREEN_MARGIN_WIDTH: u32 = 50;
    /// Vertical margin reserved for toolbars and buttons of a windowed front end.
    pub const SCREEN_MARGIN_HEIGHT: u32 = 280;

    /// Bounds of a whole screen, minus the fixed window margins.
    #[must_use]
    pub fn screen(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            margin_width: Self::SCREEN_MARGIN_WIDTH,
            margin_height: Self::SCREEN_MARGIN_HEIGHT,
        }
    }

    /// Bounds of a terminal, no margins.
    #[must_use]
    pub fn terminal(cols: u16, rows: u16) -> Self {
        Self {
            width: u32::from(cols),
            height: u32::from(rows),
            margin_width: 0,
            margin_height: 0,
        }
    }

    /// Usable `(width, height)` after margins. Never underflows.
    #[must_use]
    pub fn available(&self) -> (usize, usize) {
        (
            self.width.saturating_sub(self.margin_width) as usize,
            self.height.saturating_sub(self.margin_height) as usize,
        )
    }

    /// `true` if a `width × height` text block fits the available area.
    #[must_use]
    pub fn fits(&self, width: usize, height: usize) -> bool {
        let (max_w, max_h) = self.available();
        width <= max_w && height <= max_h
    }
}

/// Une demande de conversion, immuable une fois soumise.
#[derive(Clone, Debug)]
pub struct ConversionRequest {
    /// Image to convert. `None` models "nothing selected yet".
    pub source: Option<PathBuf>,
    /// Downscale divisor, `>= 1.0`.
    pub scale_factor: f32,
    /// Area the result is meant to be shown in.
    pub bounds: DisplayBounds,
    /// Per-run options.
    pub config: ConversionConfig,
}

impl ConversionRequest {
    /// `true` if the scale factor is finite and within `[1.0, max_scale_factor]`.
    #[must_use]
    pub fn scale_factor_in_range(&self) -> bool {
        self.scale_factor.is_finite()
            && self.scale_factor >= 1.0
            && self.scale_factor <= self.config.max_scale_factor
    }

    /// Destination size for a `width × height` source: `floor(dim / scale_factor)`.
    ///
    /// # Example
    /// ```
    /// use gs_core::request::{ConversionRequest, DisplayBounds};
    /// use gs_core::config::ConversionConfig;
    /// let req = ConversionRequest {
    ///     source: None,
    ///     scale_factor: 2.5,
    ///     bounds: DisplayBounds::terminal(80, 24),
    ///     config: ConversionConfig::default(),
    /// };
    /// assert_eq!(req.destination_size(101, 10), (40, 4));
    /// ```
    #[must_use]
    pub fn destination_size(&self, width: usize, height: usize) -> (usize, usize) {
        let scale = f64::from(self.scale_factor);
        let dest = |dim: usize| (dim as f64 / scale).floor().max(0.0) as usize;
        (dest(width), dest(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(scale_factor: f32) -> ConversionRequest {
        ConversionRequest {
            source: Some(PathBuf::from("photo.png")),
            scale_factor,
            bounds: DisplayBounds::terminal(80, 24),
            config: ConversionConfig::default(),
        }
    }

    #[test]
    fn unit_scale_keeps_source_size() {
        assert_eq!(request(1.0).destination_size(640, 480), (640, 480));
    }

    #[test]
    fn destination_is_floored() {
        assert_eq!(request(3.0).destination_size(10, 2), (3, 0));
    }

    #[test]
    fn scale_factor_range_follows_config() {
        assert!(request(1.0).scale_factor_in_range());
        assert!(request(10.0).scale_factor_in_range());
        assert!(!request(0.5).scale_factor_in_range());
        assert!(!request(10.5).scale_factor_in_range());
        assert!(!request(f32::NAN).scale_factor_in_range());
        assert!(!request(f32::INFINITY).scale_factor_in_range());
    }

    #[test]
    fn small_screen_saturates_to_zero() {
        let bounds = DisplayBounds::screen(40, 200);
        assert_eq!(bounds.available(), (0, 0));
        assert!(!bounds.fits(1, 1));
    }
}
