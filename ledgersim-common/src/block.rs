use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{crypto::hash::block_hash, utils::PeerId};

/// Per-peer voting outcome of a block.
///
/// `Pending` moves to `Confirmed` or `Rejected` exactly once. The tamper
/// marker is tracked separately on [`Block`] and does not affect the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl Verdict {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Verdict::Confirmed)
    }

    pub fn is_rejected(self) -> bool {
        matches!(self, Verdict::Rejected)
    }

    pub fn is_final(self) -> bool {
        !matches!(self, Verdict::Pending)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Pending => "pending",
            Verdict::Confirmed => "confirmed",
            Verdict::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// One entry of a peer's chain.
///
/// On the wire (snapshot file and broadcasts) a block is flattened into
/// the flag layout observers expect: `isValid`, `isConfirmed`,
/// `isRejected`, `wasTampered`, `addedBy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BlockRecord", try_from = "BlockRecord")]
pub struct Block {
    /// Zero-based position in the owning peer's chain.
    pub index: u64,
    pub data: String,
    /// Hash of the predecessor, `"0"` for genesis.
    pub previous_hash: String,
    pub hash: String,
    /// Validity as asserted by the server when the block was created.
    pub is_valid: bool,
    pub verdict: Verdict,
    pub was_tampered: bool,
    pub added_by: PeerId,
}

impl Block {
    /// Builds the successor of `previous`, pending and untampered.
    pub fn next(previous: &Block, data: &str, added_by: PeerId) -> Self {
        let index = previous.index + 1;
        Self {
            index,
            data: data.to_string(),
            previous_hash: previous.hash.clone(),
            hash: block_hash(index, data, &previous.hash),
            is_valid: true,
            verdict: Verdict::Pending,
            was_tampered: false,
            added_by,
        }
    }

    /// Re-derives the digest from the current header fields.
    pub fn computed_hash(&self) -> String {
        block_hash(self.index, &self.data, &self.previous_hash)
    }

    pub fn is_confirmed(&self) -> bool {
        self.verdict.is_confirmed()
    }

    pub fn is_rejected(&self) -> bool {
        self.verdict.is_rejected()
    }
}

/// Flat wire representation of a [`Block`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockRecord {
    index: u64,
    data: String,
    previous_hash: String,
    hash: String,
    #[serde(default = "default_valid")]
    is_valid: bool,
    #[serde(default)]
    is_confirmed: bool,
    #[serde(default)]
    is_rejected: bool,
    #[serde(default)]
    was_tampered: bool,
    #[serde(default = "PeerId::system")]
    added_by: PeerId,
}

fn default_valid() -> bool {
    true
}

impl From<Block> for BlockRecord {
    fn from(b: Block) -> Self {
        Self {
            index: b.index,
            data: b.data,
            previous_hash: b.previous_hash,
            hash: b.hash,
            is_valid: b.is_valid,
            is_confirmed: b.verdict.is_confirmed(),
            is_rejected: b.verdict.is_rejected(),
            was_tampered: b.was_tampered,
            added_by: b.added_by,
        }
    }
}

impl TryFrom<BlockRecord> for Block {
    type Error = String;

    fn try_from(r: BlockRecord) -> Result<Self, Self::Error> {
        let verdict = match (r.is_confirmed, r.is_rejected) {
            (false, false) => Verdict::Pending,
            (true, false) => Verdict::Confirmed,
            (false, true) => Verdict::Rejected,
            (true, true) => {
                return Err(format!("block {} is both confirmed and rejected", r.index));
            }
        };
        Ok(Self {
            index: r.index,
            data: r.data,
            previous_hash: r.previous_hash,
            hash: r.hash,
            is_valid: r.is_valid,
            verdict,
            was_tampered: r.was_tampered,
            added_by: r.added_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::make_genesis;

    #[test]
    fn test_next_links_to_previous() {
        let genesis = make_genesis();
        let block = Block::next(&genesis, "hello", PeerId::from("A"));

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis.hash);
        assert_eq!(block.hash, block.computed_hash());
        assert_eq!(block.verdict, Verdict::Pending);
        assert!(block.is_valid);
        assert!(!block.was_tampered);
        assert_eq!(block.added_by, PeerId::from("A"));
    }

    #[test]
    fn test_wire_layout_uses_flags() {
        let genesis = make_genesis();
        let value = serde_json::to_value(&genesis).unwrap();

        assert_eq!(value["previousHash"], "0");
        assert_eq!(value["isValid"], true);
        assert_eq!(value["isConfirmed"], true);
        assert_eq!(value["isRejected"], false);
        assert_eq!(value["wasTampered"], false);
        assert_eq!(value["addedBy"], "system");
    }

    #[test]
    fn test_bare_legacy_block_gets_defaults() {
        let json = r#"{"index":0,"data":"Genesis Block","previousHash":"0","hash":"h"}"#;
        let block: Block = serde_json::from_str(json).unwrap();

        assert!(block.is_valid);
        assert_eq!(block.verdict, Verdict::Pending);
        assert_eq!(block.added_by, PeerId::system());
    }

    #[test]
    fn test_contradictory_flags_are_refused() {
        let json = r#"{"index":2,"data":"x","previousHash":"a","hash":"b","isConfirmed":true,"isRejected":true}"#;
        let err = serde_json::from_str::<Block>(json).unwrap_err();
        assert!(err.to_string().contains("both confirmed and rejected"));
    }
}
