//! Parallel search workers and the sessions that race them.
//!
//! This module provides:
//! - CPU workers, each an explicit state machine over its own key stream
//! - Search sessions that spawn one thread per worker, return the first
//!   match and cancel the rest
//! - Cancellation and progress carried over channels only

mod cpu;
mod session;

pub use cpu::{
    KeySource, SearchResult, SearchWorker, WorkerEvent, WorkerFailure, WorkerReport, WorkerState,
    CANCEL_CHECK_INTERVAL, PROGRESS_INTERVAL,
};
pub use session::{
    Outcome, SearchCoordinator, SearchError, SearchRequest, SearchSession, SessionHandle,
    DEFAULT_REPORT_INTERVAL, MAX_WORKERS,
};
