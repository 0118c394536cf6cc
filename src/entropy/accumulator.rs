//! Rate-limited entropy pool.

use std::sync::Arc;
use std::time::Instant;

use super::{ENTROPY_THRESHOLD, MIN_SAMPLE_INTERVAL};

/// One raw observation made of two unpredictable coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntropySample {
    pub x: i64,
    pub y: i64,
}

impl EntropySample {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Folds the coordinates into a single byte.
    #[inline]
    pub fn to_byte(self) -> u8 {
        ((self.x ^ self.y) & 0xff) as u8
    }
}

/// Immutable, ordered entropy bytes handed to a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntropyPool(Arc<[u8]>);

impl EntropyPool {
    /// Returns the pool bytes in insertion order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the pool holds enough bytes to seed a search.
    pub fn is_sufficient(&self) -> bool {
        self.len() >= ENTROPY_THRESHOLD
    }

    /// Lowercase hex form used for seed derivation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl From<Vec<u8>> for EntropyPool {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl From<&[u8]> for EntropyPool {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

/// Collects samples into a byte pool up to a fixed size.
///
/// Single-threaded: the caller feeds samples synchronously as they are
/// observed.
#[derive(Debug)]
pub struct EntropyAccumulator {
    bytes: Vec<u8>,
    required: usize,
    last_accepted: Option<Instant>,
}

impl Default for EntropyAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropyAccumulator {
    /// Creates an accumulator that needs [`ENTROPY_THRESHOLD`] samples.
    pub fn new() -> Self {
        Self::with_required(ENTROPY_THRESHOLD)
    }

    pub fn with_required(required: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(required),
            required,
            last_accepted: None,
        }
    }

    /// Ingests a sample observed now. Returns whether it was kept.
    pub fn add_sample(&mut self, sample: EntropySample) -> bool {
        self.add_sample_at(sample, Instant::now())
    }

    /// Ingests a sample observed at `at`. Returns whether it was kept.
    pub fn add_sample_at(&mut self, sample: EntropySample, at: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if at.saturating_duration_since(last) < MIN_SAMPLE_INTERVAL {
                return false;
            }
        }
        if self.is_ready() {
            return false;
        }

        self.last_accepted = Some(at);
        self.bytes.push(sample.to_byte());
        true
    }

    pub fn is_ready(&self) -> bool {
        self.bytes.len() >= self.required
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn required(&self) -> usize {
        self.required
    }

    /// Fraction of the required samples collected so far, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.required == 0 {
            return 1.0;
        }
        (self.bytes.len() as f64 / self.required as f64).min(1.0)
    }

    /// Returns a snapshot of the pool. Calling it repeatedly yields the same
    /// bytes; readiness is checked separately.
    pub fn drain(&self) -> EntropyPool {
        EntropyPool::from(self.bytes.as_slice())
    }
}
