use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use gs_core::error::Outcome;
use gs_core::request::ConversionRequest;
use gs_core::traits::ConversionObserver;
use thiserror::Error;

use crate::pipeline::Pipeline;
use crate::state::{ConversionState, RunPhase, SharedState, lock_state, new_shared};

/// Notification envoyée du thread de conversion vers le front-end.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerEvent {
    /// Decode progress in `[0, 1]`.
    Progress(f64),
    /// Terminal outcome, sent exactly once per run.
    Finished(Outcome),
}

/// Observer that forwards every notification over a channel.
pub struct ChannelObserver {
    tx: flume::Sender<WorkerEvent>,
}

impl ConversionObserver for ChannelObserver {
    fn on_progress(&self, done_fraction: f64) {
        let _ = self.tx.send(WorkerEvent::Progress(done_fraction));
    }

    fn on_complete(&self, outcome: &Outcome) {
        let _ = self.tx.send(WorkerEvent::Finished(outcome.clone()));
    }
}

/// Errors from the run controller.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A run is still in flight.
    #[error("Une conversion est déjà en cours")]
    AlreadyRunning,
    /// The conversion thread could not be created.
    #[error("Impossible de lancer le thread de conversion : {0}")]
    Spawn(#[from] std::io::Error),
}

/// Demande d'annulation utilisable depuis un autre thread (handler Ctrl-C).
#[derive(Clone)]
pub struct CancelHandle {
    state: SharedState,
}

impl CancelHandle {
    /// Ask the running conversion to stop at its next row boundary.
    pub fn cancel(&self) {
        let mut st = lock_state(&self.state);
        if st.phase == RunPhase::Running {
            st.cancel_requested = true;
        }
    }
}

/// Contrôleur de runs : un thread nommé par conversion, au plus un à la fois.
///
/// The previous thread is joined when the next run starts, in [`Worker::wait`],
/// and on drop.
pub struct Worker {
    state: SharedState,
    pipeline: Arc<Mutex<Pipeline>>,
    tx: flume::Sender<WorkerEvent>,
    rx: flume::Receiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Create an idle worker around `pipeline`.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            state: new_shared(),
            pipeline: Arc::new(Mutex::new(pipeline)),
            tx,
            rx,
            handle: None,
        }
    }

    /// Start converting `request` on a background thread.
    ///
    /// # Errors
    /// `WorkerError::AlreadyRunning` while a previous run is in flight,
    /// `WorkerError::Spawn` if the thread cannot be created.
    pub fn start(&mut self, request: ConversionRequest) -> Result<(), WorkerError> {
        if self.is_running() {
            return Err(WorkerError::AlreadyRunning);
        }
        self.reap();
        // Events of a run nobody followed to the end must not reach this run's listener.
        let stale = self.rx.drain().count();
        if stale > 0 {
            log::debug!("{stale} événements du run précédent ignorés");
        }

        // Reset here, not in the thread: a cancel sent right after `start` must not be lost.
        lock_state(&self.state).begin_run();

        let state = Arc::clone(&self.state);
        let pipeline = Arc::clone(&self.pipeline);
        let observer = ChannelObserver {
            tx: self.tx.clone(),
        };
        let spawned = thread::Builder::new()
            .name("gs-convert".to_string())
            .spawn(move || {
                let mut pipeline = pipeline.lock().unwrap_or_else(PoisonError::into_inner);
                let _ = pipeline.execute(&request, &state, &observer);
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                lock_state(&self.state).phase = RunPhase::Idle;
                Err(WorkerError::Spawn(e))
            }
        }
    }

    /// Request cancellation of the current run. No effect when idle.
    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    /// `true` while the conversion thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cloneable cancellation handle for other threads.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Progress and completion notifications.
    #[must_use]
    pub fn events(&self) -> &flume::Receiver<WorkerEvent> {
        &self.rx
    }

    /// Non-blocking copy of the shared state.
    #[must_use]
    pub fn snapshot(&self) -> ConversionState {
        lock_state(&self.state).clone()
    }

    /// Block until the current run ends, then return its final state.
    pub fn wait(&mut self) -> ConversionState {
        self.reap();
        self.snapshot()
    }

    fn reap(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("Le thread de conversion a paniqué");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.cancel();
        self.reap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_core::config::ConversionConfig;
    use gs_core::error::ConvertError;
    use gs_core::request::DisplayBounds;
    use gs_core::traits::RasterProvider;
    use std::io::{BufRead, Cursor};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    const SCENARIO: &str = "P2\n4 2\n255\n0 85 170 254 254 170 85 0\n";

    /// Blocks in `acquire` until the test opens the gate.
    struct GatedRaster {
        gate: flume::Receiver<()>,
    }

    impl RasterProvider for GatedRaster {
        fn acquire(&mut self, _source: &Path) -> Result<Box<dyn BufRead + Send>, ConvertError> {
            let _ = self.gate.recv();
            Ok(Box::new(Cursor::new(SCENARIO.as_bytes().to_vec())))
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    fn gated_worker() -> (Worker, flume::Sender<()>) {
        let (open, gate) = flume::unbounded();
        (Worker::new(Pipeline::new(Box::new(GatedRaster { gate }))), open)
    }

    fn request() -> ConversionRequest {
        ConversionRequest {
            source: Some(PathBuf::from("photo.png")),
            scale_factor: 1.0,
            bounds: DisplayBounds::terminal(80, 24),
            config: ConversionConfig::default(),
        }
    }

    fn finished(worker: &Worker) -> Outcome {
        worker
            .events()
            .iter()
            .find_map(|ev| match ev {
                WorkerEvent::Finished(outcome) => Some(outcome),
                WorkerEvent::Progress(_) => None,
            })
            .unwrap()
    }

    #[test]
    fn run_completes_and_reports_over_channel() {
        let (mut worker, open) = gated_worker();
        worker.start(request()).unwrap();
        open.send(()).unwrap();

        let outcome = finished(&worker);
        assert_eq!(outcome.unwrap().lines().count(), 2);
        let state = worker.wait();
        assert_eq!(state.phase, RunPhase::Completed);
        assert!(!worker.is_running());
    }

    #[test]
    fn second_start_is_refused_while_running() {
        let (mut worker, open) = gated_worker();
        worker.start(request()).unwrap();
        assert!(worker.is_running());
        assert!(matches!(
            worker.start(request()),
            Err(WorkerError::AlreadyRunning)
        ));

        open.send(()).unwrap();
        let _ = finished(&worker);
        worker.wait();
        open.send(()).unwrap();
        worker.start(request()).unwrap();
        assert!(finished(&worker).is_ok());
    }

    #[test]
    fn cancel_before_decode_ends_cancelled() {
        let (mut worker, open) = gated_worker();
        worker.start(request()).unwrap();
        worker.cancel();
        open.send(()).unwrap();

        assert_eq!(finished(&worker), Err(ConvertError::Cancelled));
        let state = worker.wait();
        assert_eq!(state.phase, RunPhase::Cancelled);
        assert!(state.result.is_none());
        assert_eq!(state.done_fraction, 0.0);
    }

    /// Returns a black pixel on the first call and a white one afterwards.
    struct ChangingRaster {
        calls: usize,
    }

    impl RasterProvider for ChangingRaster {
        fn acquire(&mut self, _source: &Path) -> Result<Box<dyn BufRead + Send>, ConvertError> {
            self.calls += 1;
            let sample = if self.calls == 1 { 0 } else { 254 };
            Ok(Box::new(Cursor::new(format!("P2 1 1 255 {sample}").into_bytes())))
        }

        fn name(&self) -> &'static str {
            "changing"
        }
    }

    #[test]
    fn unread_events_do_not_leak_into_next_run() {
        let mut worker = Worker::new(Pipeline::new(Box::new(ChangingRaster { calls: 0 })));
        worker.start(request()).unwrap();
        let first = worker.wait();
        assert_eq!(first.result, Some(Ok(" \n".to_string())));

        worker.start(request()).unwrap();
        let followed = crate::progress::follow(&worker, None).unwrap();
        assert_eq!(followed, Ok("@\n".to_string()));
        assert_eq!(worker.wait().result, Some(followed));
        assert!(worker.events().is_empty());
    }

    #[test]
    fn cancel_while_idle_does_not_leak_into_next_run() {
        let (mut worker, open) = gated_worker();
        worker.cancel_handle().cancel();
        open.send(()).unwrap();
        worker.start(request()).unwrap();
        assert!(finished(&worker).is_ok());
    }

    #[test]
    fn snapshot_does_not_block_on_running_thread() {
        let (mut worker, open) = gated_worker();
        worker.start(request()).unwrap();
        let state = worker.snapshot();
        assert_eq!(state.phase, RunPhase::Running);
        assert!(!state.finished);
        open.send(()).unwrap();
        assert!(
            worker
                .events()
                .recv_timeout(Duration::from_secs(5))
                .is_ok()
        );
    }
}
