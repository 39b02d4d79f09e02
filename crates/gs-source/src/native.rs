use std::fmt::Write as _;
use std::io::{BufRead, Cursor};
use std::path::Path;

use gs_core::error::ConvertError;
use gs_core::traits::RasterProvider;
use image::GrayImage;

/// Samples per text line, as ImageMagick wraps plain PGM output.
const SAMPLES_PER_LINE: usize = 17;

/// Encode une image 8 bits en PGM texte (P2).
///
/// # Example
/// ```
/// use gs_source::native::encode_plain_pgm;
/// use image::GrayImage;
///
/// let img = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
/// assert_eq!(encode_plain_pgm(&img), "P2\n2 1\n255\n0 255\n");
/// ```
#[must_use]
pub fn encode_plain_pgm(img: &GrayImage) -> String {
    let (width, height) = img.dimensions();
    let mut out = String::with_capacity(16 + (width as usize * height as usize) * 4);
    let _ = write!(out, "P2\n{width} {height}\n255\n");
    for row in img.rows() {
        for (i, px) in row.enumerate() {
            let sep = if i == 0 {
                ""
            } else if i % SAMPLES_PER_LINE == 0 {
                "\n"
            } else {
                " "
            };
            let _ = write!(out, "{sep}{}", px.0[0]);
        }
        out.push('\n');
    }
    out
}

/// Convertisseur in-process basé sur la crate `image`.
///
/// # Example
/// ```no_run
/// use gs_source::native::NativeConverter;
/// use gs_core::traits::RasterProvider;
/// use std::path::Path;
///
/// let raster = NativeConverter.acquire(Path::new("photo.png")).unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeConverter;

impl RasterProvider for NativeConverter {
    fn acquire(&mut self, source: &Path) -> Result<Box<dyn BufRead + Send>, ConvertError> {
        let img = image::open(source).map_err(|e| {
            ConvertError::RasterUnavailable(format!("{}: {e}", source.display()))
        })?;
        let gray = img.to_luma8();
        log::info!(
            "Image décodée : {}x{} ({})",
            gray.width(),
            gray.height(),
            source.display()
        );
        Ok(Box::new(Cursor::new(encode_plain_pgm(&gray).into_bytes())))
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
