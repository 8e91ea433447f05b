//! Observer-side verification of a broadcast snapshot.
//!
//! The engine trusts its own stored flags. Observers should not: they
//! recompute every digest from the header fields and drop the whole
//! snapshot of a peer as soon as one block disagrees.

use serde::{Deserialize, Serialize};

use crate::{chain::GENESIS_PREVIOUS_HASH, peer::Peer, utils::PeerId};

/// Trust verdict of one observer over one peer's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub identity: PeerId,
    /// Every block is flagged valid and untampered by the server.
    pub server_asserted: bool,
    /// Every digest and link re-derives correctly from the block fields.
    pub locally_verified: bool,
    /// Index of the first block that failed local verification.
    pub first_mismatch: Option<u64>,
}

pub fn verify_peer(peer: &Peer) -> ChainReport {
    let server_asserted = peer.blocks.iter().all(|b| b.is_valid && !b.was_tampered);

    let mut first_mismatch = None;
    for (i, block) in peer.blocks.iter().enumerate() {
        let expected_prev = if i == 0 {
            GENESIS_PREVIOUS_HASH
        } else {
            peer.blocks[i - 1].hash.as_str()
        };
        if block.hash != block.computed_hash() || block.previous_hash != expected_prev {
            first_mismatch = Some(block.index);
            break;
        }
    }

    ChainReport {
        identity: peer.identity.clone(),
        server_asserted,
        locally_verified: first_mismatch.is_none(),
        first_mismatch,
    }
}

pub fn verify_snapshot(peers: &[Peer]) -> Vec<ChainReport> {
    peers.iter().map(verify_peer).collect()
}

/// Peers whose snapshot an observer may accept.
pub fn trusted_peers(peers: &[Peer]) -> Vec<&Peer> {
    peers
        .iter()
        .filter(|p| verify_peer(p).locally_verified)
        .collect()
}
