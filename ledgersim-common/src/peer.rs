use serde::{Deserialize, Serialize};

use crate::{block::Block, utils::PeerId};

/// A peer and its private copy of the chain.
///
/// `blocks` is always owned: cloning a peer deep-copies its chain, so no
/// two peers can ever observe each other's edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub identity: PeerId,
    pub blocks: Vec<Block>,
}

impl Peer {
    pub fn new(identity: PeerId, blocks: Vec<Block>) -> Self {
        Self { identity, blocks }
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Block at `index` in this peer's chain.
    pub fn block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn block_mut(&mut self, index: u64) -> Option<&mut Block> {
        usize::try_from(index).ok().and_then(move |i| self.blocks.get_mut(i))
    }

    /// Index of the first block flagged as tampered, if any.
    pub fn first_tampered(&self) -> Option<u64> {
        self.blocks.iter().find(|b| b.was_tampered).map(|b| b.index)
    }

    pub fn is_compromised(&self) -> bool {
        self.first_tampered().is_some()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
