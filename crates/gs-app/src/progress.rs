use std::io::{IsTerminal, Stderr, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{QueueableCommand, queue};
use gs_core::error::Outcome;

use crate::worker::{Worker, WorkerEvent};

const BAR_WIDTH: usize = 40;
const PULSE_WIDTH: usize = 6;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Barre de progression sur stderr, seulement si stderr est un terminal.
///
/// Pulses while the raster is being acquired, then fills as rows decode.
pub struct ProgressBar {
    out: Stderr,
    last_percent: Option<u8>,
    pulse_tick: usize,
    drawn: bool,
}

impl ProgressBar {
    /// `None` when stderr is redirected.
    #[must_use]
    pub fn for_stderr() -> Option<Self> {
        let out = std::io::stderr();
        out.is_terminal().then_some(Self {
            out,
            last_percent: None,
            pulse_tick: 0,
            drawn: false,
        })
    }

    /// Advance the indeterminate bar by one step.
    ///
    /// # Errors
    /// Returns an error if the terminal write fails.
    pub fn pulse(&mut self) -> Result<()> {
        let line = render_pulse(self.pulse_tick);
        self.pulse_tick = self.pulse_tick.wrapping_add(1);
        self.last_percent = None;
        self.print(&line)
    }

    fn print(&mut self, line: &str) -> Result<()> {
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line),
        )?;
        self.out.flush()?;
        self.drawn = true;
        Ok(())
    }

    /// Redraw if the integer percentage changed.
    ///
    /// # Errors
    /// Returns an error if the terminal write fails.
    pub fn draw(&mut self, done_fraction: f64) -> Result<()> {
        let percent = (done_fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
        if self.last_percent == Some(percent) {
            return Ok(());
        }
        self.last_percent = Some(percent);
        self.print(&render_bar(percent))
    }

    /// Erase the bar line.
    ///
    /// # Errors
    /// Returns an error if the terminal write fails.
    pub fn clear(&mut self) -> Result<()> {
        self.last_percent = None;
        if std::mem::take(&mut self.drawn) {
            self.out.queue(MoveToColumn(0))?;
            self.out.queue(Clear(ClearType::CurrentLine))?;
            self.out.flush()?;
        }
        Ok(())
    }
}

fn render_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

/// Bloc de `PULSE_WIDTH` cases qui fait des allers-retours dans la barre.
fn render_pulse(tick: usize) -> String {
    let span = BAR_WIDTH - PULSE_WIDTH;
    let phase = tick % (2 * span);
    let start = if phase <= span { phase } else { 2 * span - phase };
    format!(
        "[{}{}{}] ...",
        "-".repeat(start),
        "#".repeat(PULSE_WIDTH),
        "-".repeat(span - start)
    )
}

/// Suit les événements du worker jusqu'au résultat final.
///
/// The bar pulses until the first progress event (raster acquisition), then
/// progress events that arrive in a burst are coalesced into one redraw.
///
/// # Errors
/// Returns an error if the conversion thread ends without reporting an
/// outcome, or if drawing fails.
pub fn follow(worker: &Worker, mut bar: Option<&mut ProgressBar>) -> Result<Outcome> {
    let events = worker.events();
    let mut decoding = false;
    loop {
        let first = match events.recv_timeout(POLL_INTERVAL) {
            Ok(event) => event,
            Err(flume::RecvTimeoutError::Timeout) => {
                if !worker.is_running() && events.is_empty() {
                    anyhow::bail!("Le thread de conversion s'est arrêté sans résultat");
                }
                if !decoding && let Some(bar) = bar.as_deref_mut() {
                    bar.pulse()?;
                }
                continue;
            }
            Err(flume::RecvTimeoutError::Disconnected) => {
                anyhow::bail!("Canal de conversion fermé");
            }
        };

        let mut latest = None;
        for event in std::iter::once(first).chain(events.try_iter()) {
            match event {
                WorkerEvent::Progress(fraction) => latest = Some(fraction),
                WorkerEvent::Finished(outcome) => {
                    if let Some(bar) = bar.as_deref_mut() {
                        bar.clear().context("Effacement de la barre de progression")?;
                    }
                    return Ok(outcome);
                }
            }
        }
        if let Some(fraction) = latest {
            decoding = true;
            if let Some(bar) = bar.as_deref_mut() {
                bar.draw(fraction)?;
            }
        }
    }
}
