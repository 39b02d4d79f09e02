use std::io::BufRead;
use std::path::Path;

use crate::error::{ConvertError, Outcome};

/// Produit un raster PGM texte (P2) à partir d'une image source.
///
/// Implémenté par : `MagickConverter`, `NativeConverter`, `PassthroughReader`.
///
/// # Example
/// ```
/// use gs_core::traits::RasterProvider;
/// use gs_core::error::ConvertError;
/// use std::io::{BufRead, Cursor};
/// use std::path::Path;
///
/// struct Fixed;
/// impl RasterProvider for Fixed {
///     fn acquire(&mut self, _source: &Path) -> Result<Box<dyn BufRead + Send>, ConvertError> {
///         Ok(Box::new(Cursor::new(b"P2\n1 1\n255\n0\n".to_vec())))
///     }
///     fn name(&self) -> &'static str { "fixed" }
/// }
/// ```
pub trait RasterProvider: Send {
    /// Return a reader positioned at the start of the plaintext raster.
    ///
    /// May block on external I/O (subprocess, file system).
    ///
    /// # Errors
    /// `ConvertError::RasterUnavailable` if no raster can be produced.
    fn acquire(&mut self, source: &Path) -> Result<Box<dyn BufRead + Send>, ConvertError>;

    /// Nom lisible pour les logs.
    fn name(&self) -> &'static str;
}

/// Reçoit la progression et le résultat final d'un run.
///
/// Called from the pipeline's thread; implementations marshal to their own
/// context if they need to.
///
/// # Example
/// ```
/// use gs_core::traits::ConversionObserver;
/// use gs_core::error::Outcome;
///
/// struct Silent;
/// impl ConversionObserver for Silent {
///     fn on_progress(&self, _done_fraction: f64) {}
///     fn on_complete(&self, _outcome: &Outcome) {}
/// }
/// ```
pub trait ConversionObserver: Send {
    /// Decode progress, in `[0, 1]`. May be called once per decoded row.
    fn on_progress(&self, done_fraction: f64);

    /// Terminal notification, exactly once per run.
    fn on_complete(&self, outcome: &Outcome);
}
