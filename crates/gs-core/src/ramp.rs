/// Glyphes du plus sombre au plus clair, chacun répété (presque toujours) trois fois.
///
/// `}`, `j` and `y` appear only twice so that 86 glyphs fill 255 slots.
/// Sorted by perceived brightness.
pub const RAMP_GLYPHS: &str = concat!(
    "   ```...''':::___,,,^^^===;;;>>><<<+++!!!rrrccc***",
    "///zzz???sssLLLTTTvvv)))JJJ777|||FFFiii{{{CCC}}fffI",
    "II333111tttllluuu[[[nnneeeoooZZZ555YYYxxxjjyyaaa222",
    "EEEwwwkkkPPP666hhh999ddd444VVVOOOGGGbbbUUUAAAKKKXXX",
    "HHHmmm888RRRDDD###$$$BBBggg000MMMNNNWWWQQQ%%%&&&@@@",
);

/// Number of slots in the ramp.
pub const RAMP_LEN: usize = 255;

/// Largest storable luminance sample (last ramp index).
pub const SAMPLE_MAX: u8 = (RAMP_LEN - 1) as u8;

const _: () = assert!(RAMP_GLYPHS.len() == RAMP_LEN);

/// Saturate a raw sample into `[0, SAMPLE_MAX]`.
///
/// # Example
/// ```
/// use gs_core::ramp::clamp_sample;
/// assert_eq!(clamp_sample(-4), 0);
/// assert_eq!(clamp_sample(17), 17);
/// assert_eq!(clamp_sample(255), 254);
/// ```
#[inline(always)]
#[must_use]
pub fn clamp_sample(raw: i64) -> u8 {
    raw.clamp(0, i64::from(SAMPLE_MAX)) as u8
}

/// Table luminance → glyphe, construite une fois par run.
///
/// # Example
/// ```
/// use gs_core::ramp::GlyphRamp;
/// let ramp = GlyphRamp::new(false);
/// assert_eq!(ramp.map(0), ' ');
/// assert_eq!(ramp.map(254), '@');
/// assert_eq!(GlyphRamp::new(true).map(0), '@');
/// ```
#[derive(Clone)]
pub struct GlyphRamp {
    glyphs: [char; RAMP_LEN],
}

impl GlyphRamp {
    /// Build the ramp, reversed when `invert` is set.
    #[must_use]
    pub fn new(invert: bool) -> Self {
        let mut glyphs = [' '; RAMP_LEN];
        for (slot, ch) in glyphs.iter_mut().zip(RAMP_GLYPHS.chars()) {
            *slot = ch;
        }
        if invert {
            glyphs.reverse();
        }
        Self { glyphs }
    }

    /// Map one sample to its glyph. Out-of-range samples saturate to the last slot.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, sample: u8) -> char {
        self.glyphs[usize::from(sample.min(SAMPLE_MAX))]
    }

    /// Glyph for sample 0.
    #[must_use]
    pub fn darkest(&self) -> char {
        self.glyphs[0]
    }

    /// Glyph for `SAMPLE_MAX`.
    #[must_use]
    pub fn lightest(&self) -> char {
        self.glyphs[RAMP_LEN - 1]
    }

    /// All slots in index order.
    #[must_use]
    pub fn glyphs(&self) -> &[char; RAMP_LEN] {
        &self.glyphs
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self::new(false)
    }
}
