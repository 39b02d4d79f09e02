use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gs_core::error::{ConvertError, Outcome};

/// Phase du run courant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunPhase {
    /// No run started yet.
    #[default]
    Idle,
    /// A run is in flight.
    Running,
    /// Art was produced.
    Completed,
    /// The run ended with a user-facing error.
    Failed,
    /// The run stopped on request, without a result.
    Cancelled,
}

/// État partagé entre le thread de conversion et le front-end.
///
/// Every field is read and written under the same lock.
#[derive(Clone, Debug, Default)]
pub struct ConversionState {
    /// Decode progress in `[0, 1]`.
    pub done_fraction: f64,
    /// Set by the front end, observed at row boundaries during decode.
    pub cancel_requested: bool,
    /// `true` once the run has published its terminal state.
    pub finished: bool,
    /// Current phase.
    pub phase: RunPhase,
    /// Terminal outcome. Stays `None` for cancelled runs.
    pub result: Option<Outcome>,
}

impl ConversionState {
    /// Reset for a new run and enter `Running`.
    pub fn begin_run(&mut self) {
        *self = Self {
            phase: RunPhase::Running,
            ..Self::default()
        };
    }

    /// Record the terminal outcome of the current run.
    pub fn finish(&mut self, outcome: &Outcome) {
        self.finished = true;
        match outcome {
            Ok(_) => {
                self.phase = RunPhase::Completed;
                self.result = Some(outcome.clone());
            }
            Err(ConvertError::Cancelled) => {
                self.phase = RunPhase::Cancelled;
                self.result = None;
            }
            Err(_) => {
                self.phase = RunPhase::Failed;
                self.result = Some(outcome.clone());
            }
        }
    }
}

/// Handle partagé vers l'état de conversion.
pub type SharedState = Arc<Mutex<ConversionState>>;

/// Fresh idle state.
#[must_use]
pub fn new_shared() -> SharedState {
    Arc::new(Mutex::new(ConversionState::default()))
}

/// Lock the state, recovering it if a previous holder panicked.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, ConversionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_run_resets_previous_run() {
        let mut state = ConversionState {
            done_fraction: 0.7,
            cancel_requested: true,
            finished: true,
            phase: RunPhase::Failed,
            result: Some(Err(ConvertError::InvalidScaleFactor)),
        };
        state.begin_run();
        assert_eq!(state.done_fraction, 0.0);
        assert!(!state.cancel_requested);
        assert!(!state.finished);
        assert_eq!(state.phase, RunPhase::Running);
        assert!(state.result.is_none());
    }

    #[test]
    fn finish_maps_outcome_to_phase() {
        let mut state = ConversionState::default();
        state.finish(&Ok("@\n".into()));
        assert_eq!(state.phase, RunPhase::Completed);
        assert_eq!(state.result, Some(Ok("@\n".into())));

        state.finish(&Err(ConvertError::NoInputSelected));
        assert_eq!(state.phase, RunPhase::Failed);

        state.finish(&Err(ConvertError::Cancelled));
        assert_eq!(state.phase, RunPhase::Cancelled);
        assert!(state.result.is_none());
        assert!(state.finished);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let state = new_shared();
        let poisoner = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(state.is_poisoned());
        lock_state(&state).cancel_requested = true;
        assert!(lock_state(&state).cancel_requested);
    }
}
