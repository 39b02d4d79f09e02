use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Options copiées dans chaque `ConversionRequest`.
///
/// # Example
/// ```
/// use gs_core::config::ConversionConfig;
/// let config = ConversionConfig::default();
/// assert!(config.enforce_size_limit);
/// assert!(!config.invert_ramp);
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct ConversionConfig {
    /// Refuse output larger than the display area.
    pub enforce_size_limit: bool,
    /// Reverse the glyph ramp (for light backgrounds).
    pub invert_ramp: bool,
    /// Upper bound accepted for the scale factor.
    pub max_scale_factor: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            enforce_size_limit: true,
            invert_ramp: false,
            max_scale_factor: 10.0,
        }
    }
}

/// How the source image becomes a plaintext raster.
///
/// # Example
/// ```
/// use gs_core::config::ConverterBackend;
/// assert!(matches!(ConverterBackend::default(), ConverterBackend::Magick));
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ConverterBackend {
    /// External ImageMagick process.
    #[default]
    Magick,
    /// In-process decoding.
    Native,
    /// Source already is a plaintext PGM.
    Passthrough,
}

/// Réglages du convertisseur externe.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Backend choisi.
    pub backend: ConverterBackend,
    /// Program invoked by the `Magick` backend.
    pub program: String,
    /// Run the `Magick` command line through the platform shell.
    pub use_shell: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            backend: ConverterBackend::Magick,
            program: "magick".to_string(),
            use_shell: false,
        }
    }
}

/// Configuration complète de l'application.
///
/// Chargée depuis TOML par [`load_config`]. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use gs_core::config::AppConfig;
/// let config = AppConfig::default();
/// assert_eq!(config.scale_factor, 1.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Options par run.
    pub conversion: ConversionConfig,
    /// Convertisseur d'image.
    pub converter: ConverterConfig,
    /// Scale factor used when none is given on the command line.
    pub scale_factor: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            conversion: ConversionConfig::default(),
            converter: ConverterConfig::default(),
            scale_factor: 1.0,
        }
    }
}

impl AppConfig {
    /// Clamp numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        let max = &mut self.conversion.max_scale_factor;
        if !max.is_finite() {
            *max = ConversionConfig::default().max_scale_factor;
        }
        *max = max.clamp(1.0, 100.0);
        if !self.scale_factor.is_finite() {
            self.scale_factor = 1.0;
        }
        self.scale_factor = self.scale_factor.clamp(1.0, *max);
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    conversion: Option<ConversionSection>,
    converter: Option<ConverterSection>,
}

/// Conversion section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct ConversionSection {
    enforce_size_limit: Option<bool>,
    invert_ramp: Option<bool>,
    scale_factor: Option<f32>,
    max_scale_factor: Option<f32>,
}

/// Converter section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct ConverterSection {
    backend: Option<ConverterBackend>,
    program: Option<String>,
    use_shell: Option<bool>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use gs_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))
}

/// Parse TOML text and merge it onto the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use gs_core::config::parse_config;
/// let config = parse_config("[conversion]\ninvert_ramp = true\n").unwrap();
/// assert!(config.conversion.invert_ramp);
/// assert!(config.conversion.enforce_size_limit);
/// ```
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = AppConfig::default();

    if let Some(c) = file.conversion {
        if let Some(v) = c.enforce_size_limit {
            config.conversion.enforce_size_limit = v;
        }
        if let Some(v) = c.invert_ramp {
            config.conversion.invert_ramp = v;
        }
        if let Some(v) = c.max_scale_factor {
            config.conversion.max_scale_factor = v;
        }
        if let Some(v) = c.scale_factor {
            config.scale_factor = v;
        }
    }

    if let Some(c) = file.converter {
        if let Some(v) = c.backend {
            config.converter.backend = v;
        }
        if let Some(v) = c.program {
            config.converter.program = v;
        }
        if let Some(v) = c.use_shell {
            config.converter.use_shell = v;
        }
    }

    config.clamp_all();
    Ok(config)
}
