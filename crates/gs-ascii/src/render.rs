use gs_core::grid::LuminanceGrid;
use gs_core::ramp::GlyphRamp;
use rayon::prelude::*;

/// Rend une grille en texte : un glyphe par échantillon, `\n` après chaque ligne.
///
/// Rows are mapped in parallel and concatenated in order. No cancellation
/// checks happen here.
///
/// # Example
/// ```
/// use gs_core::grid::LuminanceGrid;
/// use gs_core::ramp::GlyphRamp;
/// use gs_ascii::render::render_text;
///
/// let grid = LuminanceGrid::from_raw(2, 2, vec![0, 254, 254, 0]).unwrap();
/// assert_eq!(render_text(&grid, &GlyphRamp::new(false)), " @\n@ \n");
/// ```
#[must_use]
pub fn render_text(grid: &LuminanceGrid, ramp: &GlyphRamp) -> String {
    let (width, height) = (grid.width(), grid.height());
    if width == 0 {
        return "\n".repeat(height);
    }

    grid.as_slice()
        .par_chunks(width)
        .map(|row| {
            let mut line = String::with_capacity(width + 1);
            line.extend(row.iter().map(|&sample| ramp.map(sample)));
            line.push('\n');
            line
        })
        .collect()
}

/// Renderer that keeps its ramp between runs and rebuilds it only when
/// the inversion setting changes.
///
/// # Example
/// ```
/// use gs_core::grid::LuminanceGrid;
/// use gs_ascii::render::TextRenderer;
///
/// let mut renderer = TextRenderer::new(false);
/// let grid = LuminanceGrid::new(3, 1);
/// assert_eq!(renderer.render(&grid, true), "@@@\n");
/// ```
pub struct TextRenderer {
    ramp: GlyphRamp,
    invert: bool,
}

impl TextRenderer {
    /// Create a renderer with the ramp in the given orientation.
    #[must_use]
    pub fn new(invert: bool) -> Self {
        Self {
            ramp: GlyphRamp::new(invert),
            invert,
        }
    }

    /// Rebuild the ramp if `invert` differs from the current orientation.
    pub fn update_if_needed(&mut self, invert: bool) {
        if self.invert != invert {
            log::debug!("Rampe de glyphes inversée : {invert}");
            self.ramp = GlyphRamp::new(invert);
            self.invert = invert;
        }
    }

    /// Current ramp.
    #[must_use]
    pub fn ramp(&self) -> &GlyphRamp {
        &self.ramp
    }

    /// Render `grid` with the ramp in the requested orientation.
    pub fn render(&mut self, grid: &LuminanceGrid, invert: bool) -> String {
        self.update_if_needed(invert);
        render_text(grid, &self.ramp)
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_core::ramp::RAMP_GLYPHS;

    fn glyph(index: usize) -> char {
        RAMP_GLYPHS.chars().nth(index).unwrap()
    }

    #[test]
    fn all_zero_grid_renders_darkest_glyph() {
        let ramp = GlyphRamp::new(false);
        let text = render_text(&LuminanceGrid::new(5, 3), &ramp);
        let row: String = std::iter::repeat_n(ramp.darkest(), 5).collect();
        assert_eq!(text, format!("{row}\n{row}\n{row}\n"));
    }

    #[test]
    fn reference_raster_maps_each_sample() {
        let grid =
            LuminanceGrid::from_raw(4, 2, vec![0, 85, 170, 254, 254, 170, 85, 0]).unwrap();
        let text = render_text(&grid, &GlyphRamp::new(false));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let expected: String = [0, 85, 170, 254].iter().map(|&i| glyph(i)).collect();
        assert_eq!(lines[0], expected);
        assert_eq!(lines[1], expected.chars().rev().collect::<String>());
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn inverted_ramp_swaps_extremes() {
        let grid = LuminanceGrid::from_raw(2, 1, vec![0, 254]).unwrap();
        let plain = render_text(&grid, &GlyphRamp::new(false));
        let inverted = render_text(&grid, &GlyphRamp::new(true));
        assert_eq!(plain, " @\n");
        assert_eq!(inverted, "@ \n");
    }

    #[test]
    fn zero_width_grid_keeps_row_terminators() {
        assert_eq!(render_text(&LuminanceGrid::new(0, 3), &GlyphRamp::default()), "\n\n\n");
        assert_eq!(render_text(&LuminanceGrid::new(4, 0), &GlyphRamp::default()), "");
    }

    #[test]
    fn renderer_rebuilds_ramp_on_toggle() {
        let mut renderer = TextRenderer::new(false);
        assert_eq!(renderer.ramp().darkest(), ' ');
        renderer.update_if_needed(true);
        assert_eq!(renderer.ramp().darkest(), '@');
        let grid = LuminanceGrid::new(1, 1);
        assert_eq!(renderer.render(&grid, false), " \n");
    }
}
