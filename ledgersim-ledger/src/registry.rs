use ledgersim_common::{
    chain::make_genesis,
    Block, LedgerError, Peer, PeerId, Result, Verdict,
};
use ledgersim_consensus::{cast_ballot, Ballot, BallotOutcome, ConsensusEvaluator, QuorumPolicy, QuorumStatus, Tally};

/// Result of a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Copy of the peer as stored after the join.
    pub peer: Peer,
    /// `false` when the identity was already registered.
    pub created: bool,
}

/// In-memory registry of peers, each with its own chain.
///
/// Insertion order is kept so listings are deterministic. The registry
/// itself does no locking and no IO; see [`crate::LedgerService`].
#[derive(Debug, Clone, Default)]
pub struct LedgerRegistry {
    peers: Vec<Peer>,
    pub(crate) evaluator: ConsensusEvaluator,
}

impl LedgerRegistry {
    pub fn new(policy: QuorumPolicy) -> Self {
        Self {
            peers: Vec::new(),
            evaluator: ConsensusEvaluator::new(policy),
        }
    }

    /// Restores a registry from a persisted snapshot.
    pub fn from_peers(peers: Vec<Peer>, policy: QuorumPolicy) -> Self {
        Self {
            peers,
            evaluator: ConsensusEvaluator::new(policy),
        }
    }

    pub fn policy(&self) -> QuorumPolicy {
        self.evaluator.policy
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub(crate) fn peers_mut(&mut self) -> &mut [Peer] {
        &mut self.peers
    }

    pub fn list_all(&self) -> Vec<Peer> {
        self.peers.clone()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn find(&self, identity: &PeerId) -> Option<&Peer> {
        self.peers.iter().find(|p| &p.identity == identity)
    }

    pub(crate) fn find_mut(&mut self, identity: &PeerId) -> Result<&mut Peer> {
        self.peers
            .iter_mut()
            .find(|p| &p.identity == identity)
            .ok_or_else(|| LedgerError::UnknownPeer(identity.clone()))
    }

    pub(crate) fn require(&self, identity: &PeerId) -> Result<&Peer> {
        self.find(identity)
            .ok_or_else(|| LedgerError::UnknownPeer(identity.clone()))
    }

    /// Registers a peer, copying the reference chain by value.
    ///
    /// The reference is the first registered peer's chain, or a fresh
    /// genesis block for an empty registry. The copy carries no votes: every
    /// block after genesis starts pending for the newcomer. Re-joining
    /// returns the existing peer untouched.
    pub fn join(&mut self, identity: Option<PeerId>) -> JoinOutcome {
        let identity = identity.unwrap_or_else(PeerId::generate);

        if let Some(existing) = self.find(&identity) {
            return JoinOutcome { peer: existing.clone(), created: false };
        }

        let blocks = match self.peers.first() {
            Some(reference) => unvoted_copy(&reference.blocks),
            None => vec![make_genesis()],
        };
        let peer = Peer::new(identity, blocks);
        self.peers.push(peer.clone());

        JoinOutcome { peer, created: true }
    }

    /// Removes a peer. Returns `false` when it was not registered.
    pub fn leave(&mut self, identity: &PeerId) -> bool {
        let before = self.peers.len();
        self.peers.retain(|p| &p.identity != identity);
        self.peers.len() != before
    }

    pub fn confirm(&mut self, identity: &PeerId, index: u64) -> Result<BallotOutcome> {
        cast_ballot(self.find_mut(identity)?, index, Ballot::Confirm)
    }

    pub fn reject(&mut self, identity: &PeerId, index: u64) -> Result<BallotOutcome> {
        cast_ballot(self.find_mut(identity)?, index, Ballot::Reject)
    }

    pub fn has_consensus(&self, index: u64) -> bool {
        self.evaluator.has_consensus(&self.peers, index)
    }

    pub fn tally(&self, index: u64) -> Tally {
        self.evaluator.tally(&self.peers, index)
    }

    pub fn quorum_status(&self, index: u64) -> QuorumStatus {
        self.evaluator.status(&self.peers, index)
    }

    /// Resyncs one peer from the first other untampered peer, or from a
    /// fresh genesis block when there is none. Votes are not copied.
    pub fn reset_peer(&mut self, identity: &PeerId) -> Result<()> {
        self.require(identity)?;

        let blocks = self
            .peers
            .iter()
            .find(|p| &p.identity != identity && !p.is_compromised())
            .map(|p| unvoted_copy(&p.blocks))
            .unwrap_or_else(|| vec![make_genesis()]);

        self.find_mut(identity)?.blocks = blocks;
        Ok(())
    }

    /// Every peer goes back to a single genesis block.
    pub fn reset_all(&mut self) {
        for peer in self.peers.iter_mut() {
            peer.blocks = vec![make_genesis()];
        }
    }
}

/// Deep copy of a chain with the votes of its owner stripped.
/// Genesis stays confirmed.
fn unvoted_copy(blocks: &[Block]) -> Vec<Block> {
    blocks
        .iter()
        .cloned()
        .map(|mut block| {
            if block.index > 0 {
                block.verdict = Verdict::Pending;
            }
            block
        })
        .collect()
}
