use anyhow::Result;
use gs_core::config::{ConverterBackend, ConverterConfig};
use gs_core::traits::RasterProvider;
use gs_source::magick::MagickConverter;
use gs_source::passthrough::PassthroughReader;

/// Instancie le convertisseur choisi dans la config.
///
/// # Errors
/// Returns an error if the ImageMagick work directory cannot be created, or if
/// the native backend is requested in a build without the `native` feature.
pub fn build_provider(config: &ConverterConfig) -> Result<Box<dyn RasterProvider>> {
    let provider: Box<dyn RasterProvider> = match config.backend {
        ConverterBackend::Magick => {
            Box::new(MagickConverter::new(config.program.clone(), config.use_shell)?)
        }
        ConverterBackend::Native => native()?,
        ConverterBackend::Passthrough => Box::new(PassthroughReader),
    };
    log::debug!("Convertisseur : {}", provider.name());
    Ok(provider)
}

#[cfg(feature = "native")]
#[allow(clippy::unnecessary_wraps)]
fn native() -> Result<Box<dyn RasterProvider>> {
    Ok(Box::new(gs_source::native::NativeConverter))
}

#[cfg(not(feature = "native"))]
fn native() -> Result<Box<dyn RasterProvider>> {
    anyhow::bail!("Convertisseur natif indisponible. Recompilez avec --features native.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_backend_builds() {
        let mut config = ConverterConfig::default();
        assert_eq!(build_provider(&config).unwrap().name(), "magick");
        config.backend = ConverterBackend::Passthrough;
        assert_eq!(build_provider(&config).unwrap().name(), "passthrough");
    }

    #[cfg(feature = "native")]
    #[test]
    fn native_backend_builds() {
        let config = ConverterConfig {
            backend: ConverterBackend::Native,
            ..ConverterConfig::default()
        };
        assert_eq!(build_provider(&config).unwrap().name(), "native");
    }
}
