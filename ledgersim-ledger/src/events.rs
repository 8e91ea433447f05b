use serde::{Deserialize, Serialize};

use ledgersim_common::{Block, Peer, PeerId};

/// Messages pushed to observers.
///
/// `Update` goes to everyone after every committed mutation. `Welcome`
/// is addressed to a freshly joined peer only and is never broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerEvent {
    Update { blockchain: Vec<Peer> },
    Welcome { identity: PeerId, blocks: Vec<Block> },
    PeerLeft { identity: PeerId },
}

impl LedgerEvent {
    pub fn welcome(peer: &Peer) -> Self {
        LedgerEvent::Welcome {
            identity: peer.identity.clone(),
            blocks: peer.blocks.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
