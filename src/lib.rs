//! # pos-consensus
//!
//! Consensus kernel of proof-of-stake block validation: stake modifier
//! derivation and the coinstake kernel hash check.
//!
//! The crate covers the consensus-critical core only. Storage, the UTXO
//! set, script verification and the network clock are collaborator seams
//! ([`chain::UtxoView`], [`chain::BlockStore`], [`chain::SignatureVerifier`],
//! [`chain::NetworkClock`]) bundled into a [`ChainContext`] that every
//! entry point receives explicitly; there is no process-wide state.
//!
//! ## Design principles
//!
//! 1. **Determinism**: every function is a pure computation over read-only
//!    snapshots; the same inputs always produce the same modifier and the
//!    same proof.
//! 2. **Bit-exact formats**: hash preimages are hand-framed little-endian
//!    byte strings, double SHA-256 throughout, 256-bit target arithmetic
//!    with fixed width. Small deviations here fork the chain.
//! 3. **Severity-aware errors**: every rejection carries whether the peer
//!    should be penalized, because a syncing node routinely relays blocks
//!    whose stake cannot be validated yet.
//!
//! ## Usage
//!
//! ```rust
//! use pos_consensus::{compute_next_stake_modifier, ChainIndex, StakeParams};
//!
//! let params = StakeParams::default();
//! let index = ChainIndex::new();
//! // the genesis block's modifier is zero and counts as generated
//! let (modifier, generated) = compute_next_stake_modifier(&index, &params, None).unwrap();
//! assert_eq!((modifier, generated), (0, true));
//! ```

pub mod chain;
pub mod error;
pub mod hashing;
pub mod kernel;
pub mod modifier;
pub mod params;
pub mod types;
pub mod uint256;
pub mod validation;

pub use chain::{BlockIndexEntry, ChainContext, ChainIndex, NodeId, SCRIPT_VERIFY_NONE};
pub use error::{Result, Severity, StakeError};
pub use kernel::{check_stake_kernel_hash, get_weight, kernel_stake_modifier, StakeProof};
pub use modifier::compute_next_stake_modifier;
pub use params::StakeParams;
pub use validation::{check_coinstake_timestamp, check_kernel, check_proof_of_stake};
