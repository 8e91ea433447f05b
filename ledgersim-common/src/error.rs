use thiserror::Error;

use crate::{block::Verdict, utils::PeerId};

/// Errors produced by the ledger engine.
///
/// Lookup failures and policy rejections leave the registry untouched.
/// `Persistence` is fatal for the operation that triggered it: the
/// in-memory mutation is rolled back before it is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Caller-supplied data is empty or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown peer: {0}")]
    UnknownPeer(PeerId),

    #[error("Unknown block {index} for peer {identity}")]
    UnknownBlock { identity: PeerId, index: u64 },

    /// The requesting peer holds a tampered block; `index` is the first one.
    #[error("Chain of peer {identity} is compromised at block {index}")]
    ChainCompromised { identity: PeerId, index: u64 },

    /// The tip of the requesting peer has not been confirmed by a quorum.
    #[error("Consensus not reached on block {index}: {confirmed}/{total} confirmations (threshold {threshold}%)")]
    ConsensusNotReached {
        index: u64,
        confirmed: usize,
        total: usize,
        threshold: u32,
    },

    /// A block that already carries a final verdict received the opposite vote.
    #[error("Block {index} of peer {identity} is already {current}")]
    VerdictConflict {
        identity: PeerId,
        index: u64,
        current: Verdict,
    },

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl LedgerError {
    /// Stable, machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidInput(_) => "InvalidInput",
            LedgerError::UnknownPeer(_) => "UnknownPeer",
            LedgerError::UnknownBlock { .. } => "UnknownBlock",
            LedgerError::ChainCompromised { .. } => "ChainCompromised",
            LedgerError::ConsensusNotReached { .. } => "ConsensusNotReached",
            LedgerError::VerdictConflict { .. } => "VerdictConflict",
            LedgerError::Persistence(_) => "PersistenceFailure",
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
