//! Ethereum address representation and derivation.

use std::fmt;

use secp256k1::PublicKey;
use tiny_keccak::{Hasher, Keccak};

use super::KeyError;

/// Marker that precedes the hex digits of a displayed address.
pub const ADDRESS_MARKER: &str = "0x";

/// An Ethereum address (20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);
    hash
}

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derives the address of a secp256k1 public key: the last 20 bytes of
    /// Keccak-256 over the uncompressed point without its `0x04` tag.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let uncompressed = public_key.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    /// Derives the address from a hex-encoded SEC1 public key, with or
    /// without the `0x` marker.
    pub fn from_public_key_hex(public_key: &str) -> Result<Self, KeyError> {
        let digits = public_key.strip_prefix(ADDRESS_MARKER).unwrap_or(public_key);
        let bytes = hex::decode(digits)?;
        let public_key = PublicKey::from_slice(&bytes)?;
        Ok(Self::from_public_key(&public_key))
    }

    /// Returns the address as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the address as a lowercase hex string (without 0x prefix).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the EIP-55 mixed-case digits, without the 0x prefix.
    pub fn checksum_digits(&self) -> String {
        let hex_addr = self.to_hex();
        let hash = keccak256(hex_addr.as_bytes());

        hex_addr
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let nibble = if i % 2 == 0 {
                    hash[i / 2] >> 4
                } else {
                    hash[i / 2] & 0x0f
                };
                if nibble >= 8 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }

    /// Returns the address with checksum encoding (EIP-55).
    pub fn to_checksum(&self) -> String {
        format!("{}{}", ADDRESS_MARKER, self.checksum_digits())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}
