//! CPU worker: one cancellable search loop over a seeded key stream.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::debug;

use crate::crypto::{DeterministicKeyStream, KeyError, Keypair};
use crate::matcher::MatchPattern;

/// Iterations between two cancellation checks.
pub const CANCEL_CHECK_INTERVAL: u64 = 256;

/// Keys between two progress messages.
pub const PROGRESS_INTERVAL: u64 = 16 * CANCEL_CHECK_INTERVAL;

/// Produces keypairs for a worker to test.
pub trait KeySource: Send {
    fn next_keypair(&mut self) -> Result<Keypair, KeyError>;
}

impl KeySource for DeterministicKeyStream {
    #[inline]
    fn next_keypair(&mut self) -> Result<Keypair, KeyError> {
        DeterministicKeyStream::next_keypair(self)
    }
}

/// A matching keypair, hex encoded with 0x prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// EIP-55 checksummed address
    pub address: String,
    /// Uncompressed SEC1 public key
    pub public_key: String,
    /// 32-byte private key
    pub private_key: String,
}

impl From<&Keypair> for SearchResult {
    fn from(keypair: &Keypair) -> Self {
        Self {
            address: keypair.address().to_checksum(),
            public_key: keypair.public_key_hex(),
            private_key: keypair.private_key_hex(),
        }
    }
}

/// Lifecycle of a worker. `Found`, `Cancelled` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Found,
    Cancelled,
    Failed,
}

impl WorkerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkerState::Found | WorkerState::Cancelled | WorkerState::Failed
        )
    }

    fn can_become(self, next: WorkerState) -> bool {
        match self {
            WorkerState::Idle => next == WorkerState::Running,
            WorkerState::Running => next.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerFailure {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("Worker {0} was already started")]
    AlreadyStarted(usize),
}

/// Terminal report of a worker run.
#[derive(Debug)]
pub enum WorkerReport {
    Found(SearchResult),
    Cancelled,
    Failed(WorkerFailure),
}

/// Messages from a worker thread to its session.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Total keys tried so far by this worker.
    Progress { worker_id: usize, keys: u64 },
    /// Sent exactly once, when the worker leaves `Running`.
    Finished {
        worker_id: usize,
        keys: u64,
        report: WorkerReport,
    },
}

/// A worker that draws keypairs from its own source and tests them.
pub struct SearchWorker<S = DeterministicKeyStream> {
    /// Worker ID
    id: usize,
    source: S,
    /// The pattern to match against
    pattern: MatchPattern,
    state: WorkerState,
    keys_tried: u64,
    progress_tx: Option<Sender<WorkerEvent>>,
}

impl<S: KeySource> SearchWorker<S> {
    pub fn new(id: usize, source: S, pattern: MatchPattern) -> Self {
        Self {
            id,
            source,
            pattern,
            state: WorkerState::Idle,
            keys_tried: 0,
            progress_tx: None,
        }
    }

    /// Reports progress on `tx` while running. Progress is dropped rather
    /// than blocking when the channel is full.
    pub fn with_progress(mut self, tx: Sender<WorkerEvent>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Runs the search loop until a match, cancellation or failure.
    ///
    /// `cancel` signals cancellation by delivering a message or by being
    /// disconnected. It is polled every [`CANCEL_CHECK_INTERVAL`] keys, so
    /// at most that many keys are tried after the signal.
    pub fn run(&mut self, cancel: &Receiver<()>) -> WorkerReport {
        if !self.transition(WorkerState::Running) {
            return WorkerReport::Failed(WorkerFailure::AlreadyStarted(self.id));
        }
        debug!("worker {} running", self.id);

        loop {
            if self.keys_tried % CANCEL_CHECK_INTERVAL == 0 {
                if is_cancelled(cancel) {
                    self.transition(WorkerState::Cancelled);
                    debug!("worker {} cancelled after {} keys", self.id, self.keys_tried);
                    return WorkerReport::Cancelled;
                }
                if self.keys_tried > 0 && self.keys_tried % PROGRESS_INTERVAL == 0 {
                    self.report_progress();
                }
            }

            let keypair = match self.source.next_keypair() {
                Ok(keypair) => keypair,
                Err(e) => {
                    self.transition(WorkerState::Failed);
                    debug!("worker {} failed: {}", self.id, e);
                    return WorkerReport::Failed(e.into());
                }
            };
            self.keys_tried += 1;

            if self.pattern.matches(keypair.address()).is_match() {
                self.transition(WorkerState::Found);
                debug!("worker {} found a match after {} keys", self.id, self.keys_tried);
                return WorkerReport::Found(SearchResult::from(&keypair));
            }
        }
    }

    fn transition(&mut self, next: WorkerState) -> bool {
        if !self.state.can_become(next) {
            return false;
        }
        self.state = next;
        if next.is_terminal() {
            self.progress_tx = None;
        }
        true
    }

    fn report_progress(&self) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.try_send(WorkerEvent::Progress {
                worker_id: self.id,
                keys: self.keys_tried,
            });
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn keys_tried(&self) -> u64 {
        self.keys_tried
    }
}

#[inline]
fn is_cancelled(cancel: &Receiver<()>) -> bool {
    !matches!(cancel.try_recv(), Err(TryRecvError::Empty))
}
