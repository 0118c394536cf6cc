//! Search sessions: validation, worker spawning and first-match racing.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{after, bounded, never, select, Receiver, Sender};
use log::{debug, info, warn};

use crate::crypto::DeterministicKeyStream;
use crate::entropy::{EntropyPool, Seed, ENTROPY_THRESHOLD};
use crate::matcher::{MatchPattern, PatternError};

use super::cpu::{KeySource, SearchResult, SearchWorker, WorkerEvent, WorkerReport};

/// Upper bound on concurrent workers per session.
pub const MAX_WORKERS: usize = 16;

/// Default interval between progress log lines.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// An unvalidated search request as supplied by a front end.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub prefix: String,
    pub suffix: String,
    pub case_sensitive: bool,
    pub worker_count: usize,
    pub entropy: EntropyPool,
}

impl SearchRequest {
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        case_sensitive: bool,
        worker_count: usize,
        entropy: impl Into<EntropyPool>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            case_sensitive,
            worker_count,
            entropy: entropy.into(),
        }
    }

    /// Checks the request and compiles its pattern.
    pub fn validate(&self) -> Result<MatchPattern, SearchError> {
        let pattern = MatchPattern::new(
            self.prefix.as_str(),
            self.suffix.as_str(),
            self.case_sensitive,
        )?;

        if !(1..=MAX_WORKERS).contains(&self.worker_count) {
            return Err(SearchError::WorkerCount(self.worker_count));
        }

        if !self.entropy.is_sufficient() {
            return Err(SearchError::InsufficientEntropy {
                have: self.entropy.len(),
                need: ENTROPY_THRESHOLD,
            });
        }

        Ok(pattern)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("Worker count must be between 1 and 16 (got {0})")]
    WorkerCount(usize),
    #[error("Not enough entropy: {have} of {need} bytes collected")]
    InsufficientEntropy { have: usize, need: usize },
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found(SearchResult),
    Cancelled,
    Failed(String),
}

impl Outcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    pub fn result(&self) -> Option<&SearchResult> {
        match self {
            Outcome::Found(result) => Some(result),
            _ => None,
        }
    }
}

/// Cancels a running session from any thread.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    cancel_tx: Sender<()>,
}

impl SessionHandle {
    /// Requests cancellation. Repeated calls, or calls after the session
    /// ended, have no effect.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.try_send(());
    }
}

/// A spawned worker thread and the sending half of its cancellation channel.
struct WorkerHandle {
    id: usize,
    cancel_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Closes the cancellation channel.
    fn cancel(&mut self) {
        self.cancel_tx = None;
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("worker {} panicked", self.id);
            }
        }
    }
}

enum Wake {
    Cancelled,
    Event(Option<WorkerEvent>),
    Tick,
}

/// One search request in flight. Owns its worker threads and releases them
/// on every exit path, including drop.
pub struct SearchSession {
    pattern: MatchPattern,
    workers: Vec<WorkerHandle>,
    events_rx: Receiver<WorkerEvent>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
    /// Latest key count reported by each worker
    progress: Vec<u64>,
    /// `None` disables periodic progress logging
    report_interval: Option<Duration>,
    start_time: Instant,
}

impl SearchSession {
    /// Validates `request` and starts one worker per derived seed.
    pub fn start(request: SearchRequest) -> Result<Self, SearchError> {
        Self::start_with(request, |_, seed| DeterministicKeyStream::new(seed))
    }

    /// Like [`start`](Self::start) with a custom key source per worker.
    ///
    /// `make_source` is called with the worker index and its seed, only
    /// after the request passed validation.
    pub fn start_with<S, F>(request: SearchRequest, make_source: F) -> Result<Self, SearchError>
    where
        S: KeySource + 'static,
        F: Fn(usize, &Seed) -> S,
    {
        let pattern = request.validate()?;
        let worker_count = request.worker_count;

        let (events_tx, events_rx) = bounded(worker_count * 4);
        let (cancel_tx, cancel_rx) = bounded(1);

        let mut session = Self {
            pattern,
            workers: Vec::with_capacity(worker_count),
            events_rx,
            cancel_tx,
            cancel_rx,
            progress: vec![0; worker_count],
            report_interval: Some(DEFAULT_REPORT_INTERVAL),
            start_time: Instant::now(),
        };

        for id in 0..worker_count {
            let seed = Seed::derive(&request.entropy, id);
            let source = make_source(id, &seed);
            match session.spawn_worker(id, source, events_tx.clone()) {
                Ok(handle) => session.workers.push(handle),
                Err(e) => {
                    // The session drains events on drop, which needs every
                    // sender gone.
                    drop(events_tx);
                    return Err(e);
                }
            }
        }
        drop(events_tx);

        info!(
            "search started: pattern {}, {} worker(s), difficulty {}",
            session.pattern,
            worker_count,
            session.pattern.estimated_difficulty()
        );
        Ok(session)
    }

    fn spawn_worker<S: KeySource + 'static>(
        &self,
        id: usize,
        source: S,
        events_tx: Sender<WorkerEvent>,
    ) -> Result<WorkerHandle, SearchError> {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let pattern = self.pattern.clone();

        let thread = thread::Builder::new()
            .name(format!("vanity-worker-{}", id))
            .spawn(move || {
                let mut worker = SearchWorker::new(id, source, pattern).with_progress(events_tx.clone());
                let report = worker.run(&cancel_rx);
                let _ = events_tx.send(WorkerEvent::Finished {
                    worker_id: id,
                    keys: worker.keys_tried(),
                    report,
                });
            })?;

        Ok(WorkerHandle {
            id,
            cancel_tx: Some(cancel_tx),
            thread: Some(thread),
        })
    }

    /// Sets how often `wait` logs progress. A zero interval disables the
    /// periodic report.
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    pub fn report_interval(&self) -> Option<Duration> {
        self.report_interval
    }

    /// Returns a handle that cancels this session.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            cancel_tx: self.cancel_tx.clone(),
        }
    }

    pub fn pattern(&self) -> &MatchPattern {
        &self.pattern
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Keys tried across all workers, as last reported.
    pub fn keys_tried(&self) -> u64 {
        self.progress.iter().sum()
    }

    /// Returns the elapsed time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the current generation rate (keys per second).
    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.keys_tried() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Blocks until the first match, caller cancellation or the failure of
    /// every worker. Remaining workers are cancelled and joined before
    /// returning; their results are discarded.
    ///
    /// A trivial pattern matches every worker's first key, so there the
    /// session waits for all reports and returns the lowest worker's.
    pub fn wait(mut self) -> Outcome {
        let total = self.workers.len();
        let settle_by_index = self.pattern.is_trivial();
        let mut finished = 0;
        let mut best: Option<(usize, SearchResult)> = None;
        let mut last_failure = None;
        let mut last_report = Instant::now();

        let outcome = loop {
            let ticker = match self.report_interval {
                Some(interval) => after(interval.saturating_sub(last_report.elapsed())),
                None => never(),
            };
            let wake = select! {
                recv(self.cancel_rx) -> _ => Wake::Cancelled,
                recv(self.events_rx) -> event => Wake::Event(event.ok()),
                recv(ticker) -> _ => Wake::Tick,
            };

            match wake {
                Wake::Cancelled => {
                    info!("search cancelled by caller");
                    break Outcome::Cancelled;
                }
                Wake::Tick => {
                    self.log_progress();
                    last_report = Instant::now();
                }
                Wake::Event(Some(WorkerEvent::Progress { worker_id, keys })) => {
                    self.progress[worker_id] = keys;
                }
                Wake::Event(Some(WorkerEvent::Finished {
                    worker_id,
                    keys,
                    report,
                })) => {
                    self.progress[worker_id] = keys;
                    finished += 1;
                    match report {
                        WorkerReport::Found(result) if !settle_by_index => {
                            info!("worker {} found {}", worker_id, result.address);
                            break Outcome::Found(result);
                        }
                        WorkerReport::Found(result) => {
                            if best.as_ref().map_or(true, |(id, _)| worker_id < *id) {
                                best = Some((worker_id, result));
                            }
                        }
                        WorkerReport::Cancelled => {
                            debug!("worker {} stopped", worker_id);
                        }
                        WorkerReport::Failed(e) => {
                            warn!("worker {} failed: {}", worker_id, e);
                            last_failure = Some(format!("worker {}: {}", worker_id, e));
                        }
                    }
                    if finished == total {
                        if let Some((worker_id, result)) = best.take() {
                            info!("worker {} found {}", worker_id, result.address);
                            break Outcome::Found(result);
                        }
                        break Outcome::Failed(match last_failure.take() {
                            Some(reason) => format!("All workers failed, last error: {}", reason),
                            None => "All workers stopped without a match".into(),
                        });
                    }
                }
                Wake::Event(None) => {
                    break Outcome::Failed("All workers exited without reporting".into());
                }
            }
        };

        self.shutdown();
        info!(
            "search finished after {} keys in {:.2}s",
            self.keys_tried(),
            self.elapsed().as_secs_f64()
        );
        outcome
    }

    fn log_progress(&self) {
        info!(
            "[{:>4}s] searched {} keys ({:.0}/s)",
            self.elapsed().as_secs(),
            self.keys_tried(),
            self.keys_per_second()
        );
    }

    /// Cancels every worker, drains their last messages and joins them.
    fn shutdown(&mut self) {
        for worker in &mut self.workers {
            worker.cancel();
        }
        // Each worker thread owns a sender; the channel disconnects once all
        // of them have exited.
        for event in self.events_rx.iter() {
            if let WorkerEvent::Finished {
                worker_id, keys, ..
            } = event
            {
                self.progress[worker_id] = keys;
            }
        }
        for worker in &mut self.workers {
            worker.join();
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Entry point for front ends: validates and runs search requests.
#[derive(Debug, Clone)]
pub struct SearchCoordinator {
    report_interval: Duration,
}

impl Default for SearchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchCoordinator {
    pub fn new() -> Self {
        Self {
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }

    /// Sets how often sessions log progress; zero disables it.
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Starts a session without waiting on it.
    pub fn start(&self, request: SearchRequest) -> Result<SearchSession, SearchError> {
        Ok(SearchSession::start(request)?.with_report_interval(self.report_interval))
    }

    /// Runs `request` to completion. Invalid requests fail before any
    /// worker is started.
    pub fn submit(&self, request: SearchRequest) -> Outcome {
        match self.start(request) {
            Ok(session) => session.wait(),
            Err(e) => {
                warn!("search rejected: {}", e);
                Outcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Address, KeyError, Keypair};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn entropy() -> Vec<u8> {
        (1..=100u8).collect()
    }

    fn request(prefix: &str, suffix: &str, workers: usize) -> SearchRequest {
        SearchRequest::new(prefix, suffix, false, workers, entropy())
    }

    enum TestSource {
        Failing,
        Panicking,
        Stream(DeterministicKeyStream),
    }

    impl KeySource for TestSource {
        fn next_keypair(&mut self) -> Result<Keypair, KeyError> {
            match self {
                TestSource::Failing => Err(secp256k1::Error::InvalidSecretKey.into()),
                TestSource::Panicking => panic!("key source exploded"),
                TestSource::Stream(stream) => stream.next_keypair(),
            }
        }
    }

    #[test]
    fn test_dead_prefix_scenario() {
        let outcome = SearchCoordinator::new().submit(request("dead", "", 4));
        let result = outcome.result().expect("search should succeed").clone();

        assert_eq!(result.address.len(), 42);
        assert!(result.address.to_lowercase().starts_with("0xdead"));
        assert_eq!(result.private_key.len(), 66);
        assert_eq!(result.public_key.len(), 2 + 130);

        // Address derived from the public key agrees with the reported one
        let from_public = Address::from_public_key_hex(&result.public_key).unwrap();
        assert_eq!(from_public.to_checksum(), result.address);

        // And so does the one derived from the private key
        let secret: [u8; 32] = hex::decode(&result.private_key[2..])
            .unwrap()
            .try_into()
            .unwrap();
        let keypair = Keypair::from_secret_key(&secp256k1::Secp256k1::signing_only(), secret).unwrap();
        assert_eq!(keypair.address().to_checksum(), result.address);
        assert_ne!(result.public_key, result.private_key);
    }

    #[test]
    fn test_empty_pattern_uses_first_candidate_of_worker_zero() {
        let pool = EntropyPool::from(entropy());
        let first = DeterministicKeyStream::new(&Seed::derive(&pool, 0))
            .next_keypair()
            .unwrap();
        let expected = Outcome::Found(SearchResult::from(&first));

        for _ in 0..20 {
            let outcome = SearchCoordinator::new().submit(request("", "", MAX_WORKERS));
            assert_eq!(outcome, expected);
        }
    }

    #[test]
    fn test_empty_pattern_skips_failed_low_workers() {
        let session = SearchSession::start_with(request("", "", 4), |id, seed| {
            if id < 2 {
                TestSource::Failing
            } else {
                TestSource::Stream(DeterministicKeyStream::new(seed))
            }
        })
        .unwrap();

        let pool = EntropyPool::from(entropy());
        let expected = DeterministicKeyStream::new(&Seed::derive(&pool, 2))
            .next_keypair()
            .unwrap();
        assert_eq!(session.wait(), Outcome::Found(SearchResult::from(&expected)));
    }

    #[test]
    fn test_invalid_pattern_starts_no_worker() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = started.clone();

        let result = SearchSession::start_with(request("zz", "", 4), move |_, seed| {
            counter.fetch_add(1, Ordering::SeqCst);
            DeterministicKeyStream::new(seed)
        });

        assert!(matches!(result, Err(SearchError::Pattern(_))));
        assert_eq!(started.load(Ordering::SeqCst), 0);

        match SearchCoordinator::new().submit(request("zz", "", 4)) {
            Outcome::Failed(reason) => assert!(reason.contains("hex")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_worker_count_bounds() {
        assert!(matches!(
            request("a", "", 0).validate(),
            Err(SearchError::WorkerCount(0))
        ));
        assert!(matches!(
            request("a", "", MAX_WORKERS + 1).validate(),
            Err(SearchError::WorkerCount(17))
        ));
        assert!(request("a", "", MAX_WORKERS).validate().is_ok());
    }

    #[test]
    fn test_insufficient_entropy_is_rejected() {
        let short = SearchRequest::new("a", "", false, 2, vec![7u8; ENTROPY_THRESHOLD - 1]);
        assert!(matches!(
            short.validate(),
            Err(SearchError::InsufficientEntropy { have: 99, need: 100 })
        ));

        let empty = SearchRequest::new("", "", false, 1, Vec::<u8>::new());
        assert!(!SearchCoordinator::new().submit(empty).is_found());
    }

    #[test]
    fn test_caller_cancellation() {
        let session = SearchSession::start(request(&"0".repeat(40), "", 2)).unwrap();
        let handle = session.handle();

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            handle.cancel();
            handle.cancel();
        });

        assert_eq!(session.wait(), Outcome::Cancelled);
        canceller.join().unwrap();
    }

    #[test]
    fn test_all_workers_failed() {
        let session = SearchSession::start_with(request("", "", 3), |_, _| TestSource::Failing).unwrap();

        match session.wait() {
            Outcome::Failed(reason) => assert!(reason.contains("All workers failed")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_single_failure_does_not_abort_session() {
        let session = SearchSession::start_with(request("", "", 2), |id, seed| {
            if id == 0 {
                TestSource::Failing
            } else {
                TestSource::Stream(DeterministicKeyStream::new(seed))
            }
        })
        .unwrap();

        let pool = EntropyPool::from(entropy());
        let expected = DeterministicKeyStream::new(&Seed::derive(&pool, 1))
            .next_keypair()
            .unwrap();
        assert_eq!(session.wait(), Outcome::Found(SearchResult::from(&expected)));
    }

    #[test]
    fn test_dropping_session_releases_workers() {
        let session = SearchSession::start(request(&"f".repeat(40), "", 3)).unwrap();
        let handle = session.handle();
        assert_eq!(session.num_workers(), 3);
        drop(session);
        // Cancelling a finished session is harmless
        handle.cancel();
    }

    #[test]
    fn test_workers_exiting_without_report_fail_the_session() {
        let session = SearchSession::start_with(request("a", "", 2), |_, _| TestSource::Panicking).unwrap();

        match session.wait() {
            Outcome::Failed(reason) => assert!(reason.contains("without reporting")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_zero_report_interval_disables_progress_ticks() {
        let session = SearchSession::start(request(&"0".repeat(40), "", 1))
            .unwrap()
            .with_report_interval(Duration::ZERO);
        assert_eq!(session.report_interval(), None);

        let handle = session.handle();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            handle.cancel();
        });
        assert_eq!(session.wait(), Outcome::Cancelled);
        canceller.join().unwrap();

        let session = SearchCoordinator::new()
            .with_report_interval(Duration::from_secs(2))
            .start(request(&"0".repeat(40), "", 1))
            .unwrap();
        assert_eq!(session.report_interval(), Some(Duration::from_secs(2)));
    }
}
