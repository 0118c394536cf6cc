//! Seeded, reproducible stream of secp256k1 secret keys.

use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use secp256k1::{Secp256k1, SecretKey, SignOnly};

use super::{KeyError, Keypair};
use crate::entropy::Seed;

/// A valid secp256k1 secret scalar: nonzero and below the curve order.
#[derive(Clone, Copy)]
pub struct KeyCandidate(SecretKey);

impl KeyCandidate {
    /// Returns the big-endian scalar bytes.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.0.secret_bytes()
    }
}

impl PartialEq for KeyCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.secret_bytes() == other.secret_bytes()
    }
}

impl Eq for KeyCandidate {}

impl std::fmt::Debug for KeyCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyCandidate(..)")
    }
}

/// Deterministic generator of key candidates.
///
/// For a fixed [`Seed`] the n-th candidate is always the same, so a
/// worker's search sequence can be replayed by truncating the stream.
pub struct DeterministicKeyStream {
    rng: ChaCha20Rng,
    secp: Secp256k1<SignOnly>,
    drawn: u64,
    rejected: u64,
}

impl DeterministicKeyStream {
    /// Creates a stream seeded by `seed`.
    pub fn new(seed: &Seed) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(*seed.as_bytes()),
            secp: Secp256k1::signing_only(),
            drawn: 0,
            rejected: 0,
        }
    }

    /// Returns the next valid candidate.
    ///
    /// Draws that are zero or not below the curve order are discarded and
    /// redrawn; they are never returned.
    pub fn next_candidate(&mut self) -> KeyCandidate {
        let mut bytes = [0u8; 32];
        loop {
            self.rng.fill_bytes(&mut bytes);
            match SecretKey::from_slice(&bytes) {
                Ok(secret) => {
                    self.drawn += 1;
                    return KeyCandidate(secret);
                }
                Err(_) => self.rejected += 1,
            }
        }
    }

    /// Draws the next candidate and derives its public key and address.
    pub fn next_keypair(&mut self) -> Result<Keypair, KeyError> {
        let candidate = self.next_candidate();
        Keypair::from_secret_key(&self.secp, candidate.secret_bytes())
    }

    /// Number of candidates returned so far.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// Number of raw draws discarded as invalid scalars.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl Iterator for DeterministicKeyStream {
    type Item = KeyCandidate;

    fn next(&mut self) -> Option<KeyCandidate> {
        Some(self.next_candidate())
    }
}
