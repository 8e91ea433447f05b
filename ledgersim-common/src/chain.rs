//! Chain primitives: genesis construction and linkage checks.

use crate::{
    block::{Block, Verdict},
    crypto::hash::block_hash,
    utils::PeerId,
};

pub const GENESIS_DATA: &str = "Genesis Block";
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Returns the genesis block. It is created already confirmed.
pub fn make_genesis() -> Block {
    Block {
        index: 0,
        data: GENESIS_DATA.to_string(),
        previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        hash: block_hash(0, GENESIS_DATA, GENESIS_PREVIOUS_HASH),
        is_valid: true,
        verdict: Verdict::Confirmed,
        was_tampered: false,
        added_by: PeerId::system(),
    }
}

/// Position of the first block whose link to its predecessor is broken.
///
/// For position 0 only `previous_hash == "0"` is required; every later block
/// must point at its predecessor's hash and carry the digest of its own
/// header.
pub fn first_broken_link(blocks: &[Block]) -> Option<usize> {
    for (i, block) in blocks.iter().enumerate() {
        if i == 0 {
            if block.previous_hash != GENESIS_PREVIOUS_HASH {
                return Some(0);
            }
            continue;
        }
        let prev = &blocks[i - 1];
        if block.previous_hash != prev.hash || block.hash != block.computed_hash() {
            return Some(i);
        }
    }
    None
}

pub fn is_chain_linked(blocks: &[Block]) -> bool {
    first_broken_link(blocks).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of(len: usize) -> Vec<Block> {
        let mut blocks = vec![make_genesis()];
        for i in 1..len {
            let next = Block::next(&blocks[i - 1], &format!("payload-{}", i), PeerId::from("A"));
            blocks.push(next);
        }
        blocks
    }

    #[test]
    fn test_genesis_layout() {
        let g = make_genesis();
        assert_eq!(g.index, 0);
        assert_eq!(g.data, "Genesis Block");
        assert_eq!(g.previous_hash, "0");
        assert_eq!(g.hash, block_hash(0, "Genesis Block", "0"));
        assert!(g.is_confirmed());
        assert!(!g.is_rejected());
        assert!(!g.was_tampered);
        assert_eq!(g.added_by.as_str(), "system");
    }

    #[test]
    fn test_fresh_chain_is_linked() {
        assert!(is_chain_linked(&[make_genesis()]));
        assert!(is_chain_linked(&chain_of(5)));
        assert!(is_chain_linked(&[]));
    }

    #[test]
    fn test_edited_data_breaks_link() {
        let mut blocks = chain_of(4);
        blocks[2].data = "forged".to_string();
        assert_eq!(first_broken_link(&blocks), Some(2));
    }

    #[test]
    fn test_rehashed_block_breaks_successor() {
        let mut blocks = chain_of(4);
        blocks[1].data = "forged".to_string();
        blocks[1].hash = blocks[1].computed_hash();
        assert_eq!(first_broken_link(&blocks), Some(2));
    }

    #[test]
    fn test_bad_genesis_previous_hash() {
        let mut blocks = chain_of(2);
        blocks[0].previous_hash = "x".to_string();
        assert_eq!(first_broken_link(&blocks), Some(0));
    }
}
