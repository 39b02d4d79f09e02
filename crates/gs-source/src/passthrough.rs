use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use gs_core::error::ConvertError;
use gs_core::traits::RasterProvider;

/// Lit directement une source qui est déjà un PGM texte.
///
/// # Example
/// ```no_run
/// use gs_source::passthrough::PassthroughReader;
/// use gs_core::traits::RasterProvider;
/// use std::path::Path;
///
/// let raster = PassthroughReader.acquire(Path::new("out.pgm")).unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughReader;

impl RasterProvider for PassthroughReader {
    fn acquire(&mut self, source: &Path) -> Result<Box<dyn BufRead + Send>, ConvertError> {
        let file = File::open(source).map_err(|e| {
            ConvertError::RasterUnavailable(format!("{}: {e}", source.display()))
        })?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}
