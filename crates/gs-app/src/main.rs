use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use gs_core::config::AppConfig;
use gs_core::error::ConvertError;
use gs_core::request::{ConversionRequest, DisplayBounds};

pub mod cli;
pub mod pipeline;
pub mod progress;
pub mod provider;
pub mod state;
pub mod worker;

/// Code de sortie conventionnel après SIGINT.
const EXIT_CANCELLED: i32 = 130;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config puis appliquer les overrides CLI
    let config = resolve_config(&cli)?;

    // 4. Construire la requête
    let request = build_request(&cli, &config);

    // 5. Convertisseur + worker
    let provider = provider::build_provider(&config.converter)?;
    let mut worker = worker::Worker::new(pipeline::Pipeline::new(provider));

    // 6. Ctrl-C → annulation coopérative
    let cancel = worker.cancel_handle();
    ctrlc::set_handler(move || {
        log::warn!("Interruption : annulation de la conversion");
        cancel.cancel();
    })
    .context("Impossible d'installer le gestionnaire Ctrl-C")?;

    // 7. Lancer et suivre le run
    worker.start(request)?;
    let mut bar = progress::ProgressBar::for_stderr();
    let outcome = progress::follow(&worker, bar.as_mut())?;
    worker.wait();

    // 8. Publier le résultat
    match outcome {
        Ok(text) => write_output(cli.output.as_deref(), &text),
        Err(ConvertError::Cancelled) => {
            log::warn!("Conversion annulée");
            drop(worker);
            std::process::exit(EXIT_CANCELLED);
        }
        Err(e) => Err(e.into()),
    }
}

/// Load the config file (or defaults) and apply CLI overrides.
fn resolve_config(cli: &cli::Cli) -> Result<AppConfig> {
    let mut config = if cli.config.exists() {
        gs_core::config::load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        AppConfig::default()
    };

    if let Some(scale) = cli.scale {
        // Pas de clamp ici : une valeur hors plage doit échouer avec InvalidScaleFactor.
        config.scale_factor = scale;
    }
    if cli.invert {
        config.conversion.invert_ramp = true;
    }
    if cli.no_size_limit {
        config.conversion.enforce_size_limit = false;
    }
    if let Some(backend) = cli.converter {
        config.converter.backend = backend.into();
    }
    Ok(config)
}

/// Build the request; display bounds come from the CLI or the terminal size.
fn build_request(cli: &cli::Cli, config: &AppConfig) -> ConversionRequest {
    let mut conversion = config.conversion;
    let bounds = if let Some((w, h)) = cli.bounds {
        DisplayBounds {
            width: w,
            height: h,
            margin_width: 0,
            margin_height: 0,
        }
    } else if let Some((w, h)) = cli.screen {
        DisplayBounds::screen(w, h)
    } else {
        match crossterm::terminal::size() {
            Ok((cols, rows)) => DisplayBounds::terminal(cols, rows),
            Err(e) => {
                log::warn!("Taille du terminal inconnue ({e}) : limite de taille désactivée");
                conversion.enforce_size_limit = false;
                DisplayBounds::terminal(0, 0)
            }
        }
    };
    log::debug!("Zone d'affichage : {:?}", bounds.available());

    ConversionRequest {
        source: cli.image.clone(),
        scale_factor: config.scale_factor,
        bounds,
        config: conversion,
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
            log::info!("Résultat écrit dans {}", path.display());
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Impossible d'écrire sur stdout")?;
        }
    }
    Ok(())
}
