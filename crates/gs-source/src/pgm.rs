//! Décodeur PGM texte (P2) en streaming.
//!
//! The header (magic, width, height, max value) may span any number of lines
//! and carry `#` comments. Samples are read token by token; row boundaries
//! come from the declared width only, never from newlines in the payload.

use std::io::BufRead;
use std::ops::ControlFlow;

use gs_core::error::ConvertError;
use gs_core::grid::LuminanceGrid;
use gs_core::ramp::clamp_sample;

/// Magic token of the plaintext grayscale format.
pub const MAGIC: &str = "P2";

/// Upper bound on the up-front sample allocation. Larger rasters grow as they decode.
const PREALLOC_LIMIT: usize = 1 << 22;

/// Parsed raster header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PgmHeader {
    /// Samples per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Declared maximum sample value.
    pub max_value: u32,
}

/// Result of decoding the sample payload.
#[derive(Debug)]
pub enum DecodeStatus {
    /// Every declared sample was read.
    Complete(LuminanceGrid),
    /// The row callback asked to stop. The partial samples are not a valid grid.
    Stopped {
        /// Samples read so far, row-major.
        partial: Vec<u8>,
        /// Fully decoded rows.
        rows_decoded: usize,
    },
}

/// Whitespace tokenizer over a buffered reader, one line in memory at a time.
struct Tokens<R> {
    reader: R,
    line: String,
    pos: usize,
    line_no: usize,
}

impl<R: BufRead> Tokens<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            pos: 0,
            line_no: 0,
        }
    }

    /// Next whitespace-separated token, skipping `#` comments. `None` at EOF.
    fn next_token(&mut self) -> Result<Option<&str>, ConvertError> {
        loop {
            let bytes = self.line.as_bytes();
            let mut i = self.pos;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b'#' {
                i = bytes.len();
            }
            if i < bytes.len() {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                self.pos = i;
                return Ok(Some(&self.line[start..i]));
            }

            self.line.clear();
            self.pos = 0;
            let n = self.reader.read_line(&mut self.line).map_err(|e| {
                ConvertError::MalformedRaster(format!(
                    "read error after line {}: {e}",
                    self.line_no
                ))
            })?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;
        }
    }

    fn line_no(&self) -> usize {
        self.line_no
    }
}

/// Streaming decoder for one plaintext raster.
///
/// # Example
/// ```
/// use gs_source::pgm::{DecodeStatus, PgmDecoder};
/// use std::ops::ControlFlow;
///
/// let raster = "P2\n4 2\n255\n0 85 170 254 254 170 85 0\n";
/// let decoder = PgmDecoder::new(raster.as_bytes()).unwrap();
/// assert_eq!(decoder.header().width, 4);
/// let DecodeStatus::Complete(grid) = decoder.decode(|_| ControlFlow::Continue(())).unwrap() else {
///     panic!("stopped");
/// };
/// assert_eq!(grid.row(1), &[254, 170, 85, 0]);
/// ```
pub struct PgmDecoder<R> {
    tokens: Tokens<R>,
    header: PgmHeader,
}

impl<R: BufRead> PgmDecoder<R> {
    /// Read and validate the header.
    ///
    /// # Errors
    /// `ConvertError::MalformedRaster` if the magic is not `P2` or a header
    /// field is missing or not a non-negative integer.
    pub fn new(reader: R) -> Result<Self, ConvertError> {
        let mut tokens = Tokens::new(reader);

        match tokens.next_token()? {
            Some(MAGIC) => {}
            Some(other) => {
                return Err(ConvertError::MalformedRaster(format!(
                    "unsupported magic {other:?}, expected {MAGIC}"
                )));
            }
            None => return Err(ConvertError::MalformedRaster("empty raster".into())),
        }

        let width = header_field::<usize, _>(&mut tokens, "width")?;
        let height = header_field::<usize, _>(&mut tokens, "height")?;
        let max_value = header_field::<u32, _>(&mut tokens, "max value")?;

        if max_value > 255 {
            log::warn!("Valeur max {max_value} > 255 : les échantillons seront saturés");
        }
        log::debug!("En-tête PGM : {width}x{height}, max {max_value}");

        Ok(Self {
            tokens,
            header: PgmHeader {
                width,
                height,
                max_value,
            },
        })
    }

    /// Parsed header.
    #[must_use]
    pub fn header(&self) -> &PgmHeader {
        &self.header
    }

    /// Decode `width * height` samples, calling `on_row(rows_done)` after each row.
    ///
    /// Each sample is clamped into the glyph-ramp domain. Returning
    /// `ControlFlow::Break` from `on_row` stops decoding immediately.
    ///
    /// # Errors
    /// `ConvertError::MalformedRaster` if a sample is not an integer, the
    /// payload ends early, or the declared size overflows.
    pub fn decode<F>(mut self, mut on_row: F) -> Result<DecodeStatus, ConvertError>
    where
        F: FnMut(usize) -> ControlFlow<()>,
    {
        let PgmHeader { width, height, .. } = self.header;
        let total = width.checked_mul(height).ok_or_else(|| {
            ConvertError::MalformedRaster(format!("declared size {width}x{height} overflows"))
        })?;
        let mut data = Vec::with_capacity(total.min(PREALLOC_LIMIT));

        for row in 0..height {
            for _ in 0..width {
                let parsed = match self.tokens.next_token()? {
                    Some(token) => token.parse::<i64>().map_err(|_| token.to_owned()),
                    None => {
                        return Err(ConvertError::MalformedRaster(format!(
                            "raster truncated: expected {total} samples, found {}",
                            data.len()
                        )));
                    }
                };
                let value = parsed.map_err(|token| {
                    ConvertError::MalformedRaster(format!(
                        "invalid sample {token:?} on line {}",
                        self.tokens.line_no()
                    ))
                })?;
                data.push(clamp_sample(value));
            }
            if on_row(row + 1).is_break() {
                return Ok(DecodeStatus::Stopped {
                    partial: data,
                    rows_decoded: row + 1,
                });
            }
        }

        if self.tokens.next_token()?.is_some() {
            log::warn!("Échantillons en trop après {total} valeurs, ignorés");
        }

        let grid = LuminanceGrid::from_raw(width, height, data)
            .map_err(|e| ConvertError::MalformedRaster(e.to_string()))?;
        Ok(DecodeStatus::Complete(grid))
    }
}

fn header_field<T, R>(tokens: &mut Tokens<R>, name: &str) -> Result<T, ConvertError>
where
    T: std::str::FromStr,
    R: BufRead,
{
    match tokens.next_token()? {
        Some(token) => token.parse::<T>().map_err(|_| {
            ConvertError::MalformedRaster(format!("header {name} {token:?} is not a valid number"))
        }),
        None => Err(ConvertError::MalformedRaster(format!(
            "header ends before {name}"
        ))),
    }
}

/// Convenience for tests and one-shot use: decode a whole in-memory raster.
///
/// # Errors
/// Same as [`PgmDecoder::new`] and [`PgmDecoder::decode`].
///
/// # Example
/// ```
/// use gs_source::pgm::decode_str;
/// let grid = decode_str("P2 2 1 255 7 300").unwrap();
/// assert_eq!(grid.as_slice(), &[7, 254]);
/// ```
pub fn decode_str(raster: &str) -> Result<LuminanceGrid, ConvertError> {
    match PgmDecoder::new(raster.as_bytes())?.decode(|_| ControlFlow::Continue(()))? {
        DecodeStatus::Complete(grid) => Ok(grid),
        DecodeStatus::Stopped { .. } => Err(ConvertError::Cancelled),
    }
}
