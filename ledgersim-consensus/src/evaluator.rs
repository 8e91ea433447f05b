use serde::{Deserialize, Serialize};
use tracing::debug;

use ledgersim_common::Peer;

pub const DEFAULT_THRESHOLD_PERCENT: u32 = 67;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    /// Percentage of peers that must have confirmed a block index.
    /// The comparison is strict: exactly `threshold_percent` is not enough.
    pub threshold_percent: u32,
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        Self { threshold_percent: DEFAULT_THRESHOLD_PERCENT }
    }
}

impl QuorumPolicy {
    pub fn new(threshold_percent: u32) -> Self {
        Self { threshold_percent }
    }
}

/// Confirmation count for one block index at the time of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub index: u64,
    pub confirmed: usize,
    pub total: usize,
}

impl Tally {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.confirmed as f64 / self.total as f64) * 100.0
    }
}

/// Tally, threshold and verdict of one index, taken from the same peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumStatus {
    #[serde(flatten)]
    pub tally: Tally,
    pub threshold: u32,
    pub reached: bool,
}

/// Componente responsável por avaliar consenso com base nos votos de cada peer.
#[derive(Debug, Clone, Default)]
pub struct ConsensusEvaluator {
    pub policy: QuorumPolicy,
}

impl ConsensusEvaluator {
    pub fn new(policy: QuorumPolicy) -> Self {
        Self { policy }
    }

    /// Counts the peers whose own copy of block `index` is confirmed.
    pub fn tally(&self, peers: &[Peer], index: u64) -> Tally {
        let confirmed = peers
            .iter()
            .filter(|p| p.block(index).is_some_and(|b| b.is_confirmed()))
            .count();

        Tally { index, confirmed, total: peers.len() }
    }

    /// Strict quorum test over a tally; an empty registry never has consensus.
    pub fn is_reached(&self, tally: &Tally) -> bool {
        if tally.total == 0 {
            return false;
        }
        // confirmed / total * 100 > threshold, kept in integers
        (tally.confirmed as u64) * 100 > (self.policy.threshold_percent as u64) * (tally.total as u64)
    }

    pub fn status(&self, peers: &[Peer], index: u64) -> QuorumStatus {
        let tally = self.tally(peers, index);
        QuorumStatus {
            tally,
            threshold: self.policy.threshold_percent,
            reached: self.is_reached(&tally),
        }
    }

    pub fn has_consensus(&self, peers: &[Peer], index: u64) -> bool {
        let tally = self.tally(peers, index);
        let reached = self.is_reached(&tally);

        debug!(
            "🗳️ Bloco [{}]: {}/{} confirmações ({:.1}%, limiar {}%) -> {}",
            index,
            tally.confirmed,
            tally.total,
            tally.percent(),
            self.policy.threshold_percent,
            if reached { "✅ CONSENSO" } else { "⏳ PENDENTE" }
        );

        reached
    }
}
