//! Error types and DoS severity model for stake validation.

use thiserror::Error;

/// How the caller should treat a failed check.
///
/// The split matters for peer management: an honest node that is still
/// syncing can relay blocks whose stake cannot be validated yet, and must
/// not be banned for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Malformed input that well-formed callers never produce.
    Structural,
    /// Clear protocol violation; reject the block and penalize the peer.
    BanWorthy,
    /// Reject without strong penalty; expected during sync and across reorgs.
    SoftFail,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    #[error("transaction is not a coinstake")]
    NotCoinStake,

    #[error("no stake modifier generated at genesis block")]
    MissingGenesisModifier,

    #[error("candidate block missing from the index")]
    CandidateNotIndexed,

    #[error("no candidate block selectable at round {round}")]
    NoCandidateSelected { round: u32 },

    #[error("stake prevout does not exist")]
    PrevoutMissing,

    #[error("block at height {height} for prevout can not be loaded")]
    AncestorNotFound { height: u32 },

    #[error("block not found on disk")]
    BlockNotFound,

    #[error("prevout transaction not yet in chain")]
    PrevoutNotInChain,

    #[error("signature check failed on coinstake")]
    SignatureFailed,

    #[error("coinstake timestamp before staked output timestamp")]
    TimeViolation,

    #[error("staked output below minimum age")]
    MinAgeViolation,

    #[error("compact target is invalid")]
    InvalidTarget,

    #[error("staked block not indexed")]
    BlockNotIndexed,

    #[error("stake modifier walk reached best block at height {height}")]
    ModifierBeyondTip { height: u32 },

    #[error("stake modifier not yet available")]
    ModifierNotAvailable,

    #[error("proof-of-stake hash above weighted target")]
    ProofAboveTarget,
}

impl StakeError {
    pub fn severity(&self) -> Severity {
        match self {
            StakeError::NotCoinStake
            | StakeError::MissingGenesisModifier
            | StakeError::CandidateNotIndexed
            | StakeError::NoCandidateSelected { .. } => Severity::Structural,

            StakeError::PrevoutMissing
            | StakeError::AncestorNotFound { .. }
            | StakeError::BlockNotFound
            | StakeError::SignatureFailed
            | StakeError::TimeViolation
            | StakeError::MinAgeViolation
            | StakeError::InvalidTarget
            | StakeError::BlockNotIndexed
            | StakeError::ModifierBeyondTip { .. } => Severity::BanWorthy,

            StakeError::PrevoutNotInChain
            | StakeError::ModifierNotAvailable
            | StakeError::ProofAboveTarget => Severity::SoftFail,
        }
    }

    /// Misbehavior score for the relaying peer, mirroring the ancestry of
    /// this codebase: 100 for ban-worthy rejections, 1 for failures that can
    /// occur during initial download or behind the tip.
    pub fn dos_score(&self) -> u32 {
        match self.severity() {
            Severity::Structural => 0,
            Severity::BanWorthy => 100,
            Severity::SoftFail => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, StakeError>;
