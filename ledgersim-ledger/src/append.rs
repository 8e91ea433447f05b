use serde::{Deserialize, Serialize};

use ledgersim_common::{Block, LedgerError, PeerId, Result};

use crate::registry::LedgerRegistry;

/// Outcome of a successful append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReceipt {
    pub block: Block,
    /// Peers that did not receive the block because their chain is
    /// compromised. Non-empty means partial success.
    pub skipped: Vec<PeerId>,
}

impl AppendReceipt {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

impl LedgerRegistry {
    /// Validates and commits a new block proposed by `identity`.
    ///
    /// Checks run in order and nothing is mutated until all of them pass:
    /// non-empty data, known peer, untampered chain, consensus on the
    /// requester's tip. The block is then copied onto every peer whose own
    /// chain is not compromised.
    pub fn append(&mut self, identity: &PeerId, data: &str) -> Result<AppendReceipt> {
        if data.trim().is_empty() {
            return Err(LedgerError::InvalidInput("block data is required".to_string()));
        }

        let requester = self.require(identity)?;

        if let Some(index) = requester.first_tampered() {
            return Err(LedgerError::ChainCompromised { identity: identity.clone(), index });
        }

        let last = requester
            .last_block()
            .ok_or_else(|| LedgerError::UnknownBlock { identity: identity.clone(), index: 0 })?;

        let tally = self.evaluator.tally(self.peers(), last.index);
        if !self.evaluator.is_reached(&tally) {
            return Err(LedgerError::ConsensusNotReached {
                index: last.index,
                confirmed: tally.confirmed,
                total: tally.total,
                threshold: self.policy().threshold_percent,
            });
        }

        let block = Block::next(last, data, identity.clone());

        let mut skipped = Vec::new();
        for peer in self.peers_mut() {
            if peer.is_compromised() {
                skipped.push(peer.identity.clone());
                continue;
            }
            peer.blocks.push(block.clone());
        }

        Ok(AppendReceipt { block, skipped })
    }
}
