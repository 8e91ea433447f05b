//! consensus
//!
//! Per-peer voting on blocks and quorum evaluation across the registry.
//!
//! Votes are recorded on each peer's own copy of a block; the quorum is a
//! pure query over all peers, recomputed on every call.

pub mod evaluator;
pub mod voting;

pub use evaluator::{ConsensusEvaluator, QuorumPolicy, QuorumStatus, Tally};
pub use voting::{cast_ballot, Ballot, BallotOutcome};
