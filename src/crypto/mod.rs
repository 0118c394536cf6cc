//! Cryptographic operations for Ethereum key and address generation.
//!
//! This module provides:
//! - A seeded, reproducible stream of valid secp256k1 secret keys
//! - Public key and Ethereum address derivation using Keccak-256
//! - Keypair management

mod address;
mod keypair;
mod keystream;

pub use address::{Address, ADDRESS_MARKER};
pub use keypair::Keypair;
pub use keystream::{DeterministicKeyStream, KeyCandidate};

/// Errors raised while deriving keys or addresses.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Key derivation failed: {0}")]
    Secp256k1(#[from] secp256k1::Error),
    #[error("Invalid hex encoding: {0}")]
    Hex(#[from] hex::FromHexError),
}
