use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gs_core::config::ConverterBackend;

/// grayscii: convert an image to ASCII art.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Image source (any format the converter understands).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Facteur de réduction (>= 1.0). Défaut : valeur du fichier de config.
    #[arg(short, long)]
    pub scale: Option<f32>,

    /// Inverser la rampe de glyphes (fond clair).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Ne pas refuser une sortie plus grande que la zone d'affichage.
    #[arg(long, default_value_t = false)]
    pub no_size_limit: bool,

    /// Zone d'affichage en caractères, ex. 200x60. Défaut : taille du terminal.
    #[arg(long, value_parser = parse_size, conflicts_with = "screen")]
    pub bounds: Option<(u32, u32)>,

    /// Taille d'écran, ex. 1920x1080, moins les marges d'une fenêtre.
    #[arg(long, value_parser = parse_size)]
    pub screen: Option<(u32, u32)>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Convertisseur d'image (remplace la config).
    #[arg(long, value_enum)]
    pub converter: Option<ConverterArg>,

    /// Écrire le résultat dans ce fichier au lieu de stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Choix du convertisseur en ligne de commande.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConverterArg {
    /// ImageMagick subprocess.
    Magick,
    /// In-process decoder.
    Native,
    /// The image already is a plaintext PGM.
    Passthrough,
}

impl From<ConverterArg> for ConverterBackend {
    fn from(arg: ConverterArg) -> Self {
        match arg {
            ConverterArg::Magick => Self::Magick,
            ConverterArg::Native => Self::Native,
            ConverterArg::Passthrough => Self::Passthrough,
        }
    }
}

/// Parse `WIDTHxHEIGHT`.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("format attendu LARGEURxHAUTEUR, reçu {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("{v:?} : {e}"))
    };
    Ok((parse(w)?, parse(h)?))
}
