//! # vanity_search
//!
//! Entropy-seeded Ethereum vanity address search.
//!
//! ## Architecture
//!
//! - `entropy`: Entropy collection and per-worker seed derivation
//! - `crypto`: Deterministic key streams and address derivation
//! - `matcher`: Prefix/suffix pattern matching
//! - `worker`: Search workers and first-match-wins sessions
//! - `config`: Command line configuration

pub mod config;
pub mod crypto;
pub mod entropy;
pub mod matcher;
pub mod worker;

pub use config::Config;
pub use crypto::{Address, DeterministicKeyStream, KeyCandidate, Keypair};
pub use entropy::{EntropyAccumulator, EntropyPool, EntropySample, Seed};
pub use matcher::{MatchPattern, MatchResult};
pub use worker::{
    Outcome, SearchCoordinator, SearchError, SearchRequest, SearchResult, SearchSession,
    SessionHandle,
};
