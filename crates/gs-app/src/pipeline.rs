use std::ops::ControlFlow;

use gs_ascii::render::TextRenderer;
use gs_core::error::{ConvertError, Outcome};
use gs_core::request::ConversionRequest;
use gs_core::traits::{ConversionObserver, RasterProvider};
use gs_source::pgm::{DecodeStatus, PgmDecoder, PgmHeader};
use gs_source::resize::resample;

use crate::state::{SharedState, lock_state};

/// Pipeline de conversion : acquisition, décodage, validation, rééchantillonnage, rendu.
///
/// Owns the raster provider (which may cache between runs) and the text
/// renderer (which keeps its ramp between runs).
pub struct Pipeline {
    provider: Box<dyn RasterProvider>,
    renderer: TextRenderer,
}

impl Pipeline {
    /// Create a pipeline around `provider`.
    #[must_use]
    pub fn new(provider: Box<dyn RasterProvider>) -> Self {
        Self {
            provider,
            renderer: TextRenderer::default(),
        }
    }

    /// Run one conversion on a `state` already reset by `begin_run`.
    ///
    /// Publishes the terminal state and notifies `observer.on_complete`
    /// exactly once, whatever the outcome. A failure that follows a cancel
    /// request is reported as `Cancelled`: interrupting the converter makes
    /// acquisition or decoding fail as a side effect.
    pub fn execute(
        &mut self,
        request: &ConversionRequest,
        state: &SharedState,
        observer: &dyn ConversionObserver,
    ) -> Outcome {
        let outcome = match self.convert(request, state, observer) {
            Err(e) if !e.is_cancelled() && lock_state(state).cancel_requested => {
                log::debug!("Échec après demande d'annulation : {e}");
                Err(ConvertError::Cancelled)
            }
            other => other,
        };
        publish(state, observer, &outcome);
        outcome
    }

    fn convert(
        &mut self,
        request: &ConversionRequest,
        state: &SharedState,
        observer: &dyn ConversionObserver,
    ) -> Outcome {
        let Some(source) = request.source.as_deref() else {
            return Err(ConvertError::NoInputSelected);
        };
        if !request.scale_factor_in_range() {
            log::debug!(
                "Facteur d'échelle {} hors de [1, {}]",
                request.scale_factor,
                request.config.max_scale_factor
            );
            return Err(ConvertError::InvalidScaleFactor);
        }

        log::info!(
            "Acquisition de {} via {}",
            source.display(),
            self.provider.name()
        );
        let raster = self.provider.acquire(source)?;
        let decoder = PgmDecoder::new(raster)?;
        let PgmHeader { width, height, .. } = *decoder.header();

        // La taille de sortie ne dépend que de l'en-tête : valider avant de lire les échantillons.
        let (dest_width, dest_height) = request.destination_size(width, height);
        log::info!("Source {width}x{height} -> sortie {dest_width}x{dest_height}");
        if request.config.enforce_size_limit && !request.bounds.fits(dest_width, dest_height) {
            let (max_width, max_height) = request.bounds.available();
            return Err(ConvertError::OutputTooLarge {
                width: dest_width,
                height: dest_height,
                max_width,
                max_height,
            });
        }
        if dest_width == 0 || dest_height == 0 {
            return Err(ConvertError::InvalidScaleFactor);
        }

        let status = decoder.decode(|rows_done| {
            let fraction = {
                let mut st = lock_state(state);
                if st.cancel_requested {
                    return ControlFlow::Break(());
                }
                st.done_fraction = rows_done as f64 / height as f64;
                st.done_fraction
            };
            observer.on_progress(fraction);
            ControlFlow::Continue(())
        })?;

        let grid = match status {
            DecodeStatus::Complete(grid) => grid,
            DecodeStatus::Stopped { rows_decoded, .. } => {
                log::info!("Annulation après {rows_decoded}/{height} lignes");
                return Err(ConvertError::Cancelled);
            }
        };
        if lock_state(state).cancel_requested {
            return Err(ConvertError::Cancelled);
        }

        let resized = resample(&grid, dest_width, dest_height);
        Ok(self.renderer.render(&resized, request.config.invert_ramp))
    }
}

fn publish(state: &SharedState, observer: &dyn ConversionObserver, outcome: &Outcome) {
    lock_state(state).finish(outcome);
    match outcome {
        Ok(text) => log::info!("Conversion terminée ({} octets)", text.len()),
        Err(ConvertError::Cancelled) => log::info!("Conversion annulée"),
        Err(e) => log::warn!("Conversion échouée : {e}"),
    }
    observer.on_complete(outcome);
}
