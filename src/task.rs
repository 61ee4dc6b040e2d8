use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::error::CacheError;
use crate::ingest::{IngestionOrchestrator, RunResult};
use crate::provider::StatsProvider;

pub struct IngestTask {
    player: String,
    cancel: Arc<AtomicBool>,
    rx: Receiver<Result<RunResult, CacheError>>,
    handle: Option<JoinHandle<()>>,
}

pub fn spawn_ingest<P>(orchestrator: Arc<IngestionOrchestrator<P>>, player: &str) -> IngestTask
where
    P: StatsProvider + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let worker_player = player.to_string();
    let handle = thread::spawn(move || {
        let result = orchestrator.run_cancellable(&worker_player, &worker_cancel);
        let _ = tx.send(result);
    });

    IngestTask {
        player: player.trim().to_string(),
        cancel,
        rx,
        handle: Some(handle),
    }
}

impl IngestTask {
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Requests cancellation. A run already past its final check still commits.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn try_result(&mut self) -> Option<Result<RunResult, CacheError>> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.reap();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.reap();
                Some(Err(self.worker_lost()))
            }
        }
    }

    pub fn wait(mut self) -> Result<RunResult, CacheError> {
        let result = self.rx.recv().unwrap_or_else(|_| Err(self.worker_lost()));
        self.reap();
        result
    }

    fn reap(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn worker_lost(&self) -> CacheError {
        CacheError::WorkerLost {
            player: self.player.clone(),
        }
    }
}
