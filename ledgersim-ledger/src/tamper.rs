//! Tamper engine and the manual edit levers used to simulate an attack.
//!
//! `mark_tampered` is declarative: whoever detected a mismatch flags the
//! block, and the flag spreads to everything built on top of it. The
//! edit/rehash levers change block fields and leave the flags alone, so
//! the mismatch is only visible to an observer that recomputes digests.

use ledgersim_common::{chain::GENESIS_PREVIOUS_HASH, LedgerError, PeerId, Result};

use crate::registry::LedgerRegistry;

impl LedgerRegistry {
    /// Flags block `index` and every later block of `identity` as tampered.
    /// Returns how many blocks carry the flag now.
    pub fn mark_tampered(&mut self, identity: &PeerId, index: u64) -> Result<usize> {
        let peer = self.find_mut(identity)?;
        if peer.block(index).is_none() {
            return Err(LedgerError::UnknownBlock { identity: identity.clone(), index });
        }

        let start = index as usize;
        for block in peer.blocks[start..].iter_mut() {
            block.was_tampered = true;
        }
        Ok(peer.blocks.len() - start)
    }

    /// Overwrites the data of one block while keeping its stored hash.
    pub fn edit_block(&mut self, identity: &PeerId, index: u64, data: &str) -> Result<()> {
        if data.trim().is_empty() {
            return Err(LedgerError::InvalidInput("block data is required".to_string()));
        }
        let peer = self.find_mut(identity)?;
        let block = peer
            .block_mut(index)
            .ok_or_else(|| LedgerError::UnknownBlock { identity: identity.clone(), index })?;

        block.data = data.to_string();
        Ok(())
    }

    /// Re-links one block to its predecessor and recomputes its digest.
    ///
    /// The successor, if any, keeps pointing at the old digest.
    pub fn rehash_block(&mut self, identity: &PeerId, index: u64) -> Result<String> {
        let peer = self.find_mut(identity)?;
        if peer.block(index).is_none() {
            return Err(LedgerError::UnknownBlock { identity: identity.clone(), index });
        }

        let position = index as usize;
        let previous_hash = if position == 0 {
            GENESIS_PREVIOUS_HASH.to_string()
        } else {
            peer.blocks[position - 1].hash.clone()
        };

        let block = &mut peer.blocks[position];
        block.previous_hash = previous_hash;
        block.hash = block.computed_hash();
        Ok(block.hash.clone())
    }
}
