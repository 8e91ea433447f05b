use std::fmt;

use serde::{Deserialize, Serialize};

use ledgersim_common::{LedgerError, Peer, Result, Verdict};

/// A peer's vote on one of its own blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ballot {
    Confirm,
    Reject,
}

impl Ballot {
    fn target(self) -> Verdict {
        match self {
            Ballot::Confirm => Verdict::Confirmed,
            Ballot::Reject => Verdict::Rejected,
        }
    }
}

impl fmt::Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Ballot::Confirm => "Confirm",
            Ballot::Reject => "Reject",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallotOutcome {
    /// The verdict moved from pending to the ballot's target.
    Recorded,
    /// The block already carried this verdict.
    Unchanged,
}

/// Applies `ballot` to block `index` of `peer` only.
///
/// Pending blocks take the verdict. Repeating the same ballot is idempotent;
/// the opposite ballot on a decided block is a `VerdictConflict`.
pub fn cast_ballot(peer: &mut Peer, index: u64, ballot: Ballot) -> Result<BallotOutcome> {
    let identity = peer.identity.clone();
    let block = peer
        .block_mut(index)
        .ok_or_else(|| LedgerError::UnknownBlock { identity: identity.clone(), index })?;

    let target = ballot.target();
    match block.verdict {
        Verdict::Pending => {
            block.verdict = target;
            Ok(BallotOutcome::Recorded)
        }
        current if current == target => Ok(BallotOutcome::Unchanged),
        current => Err(LedgerError::VerdictConflict { identity, index, current }),
    }
}
