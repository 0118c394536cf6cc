//! Entropy collection and seed derivation.
//!
//! Raw unpredictable observations are folded into an [`EntropyPool`] by the
//! [`EntropyAccumulator`]; each search worker then gets its own [`Seed`]
//! derived from the pool and its index.

mod accumulator;
mod seed;

pub use accumulator::{EntropyAccumulator, EntropyPool, EntropySample};
pub use seed::Seed;

use std::time::Duration;

/// Number of entropy bytes required before a search may start.
pub const ENTROPY_THRESHOLD: usize = 100;

/// Samples arriving faster than this after the last accepted one are dropped.
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(50);
