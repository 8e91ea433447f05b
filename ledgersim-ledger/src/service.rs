use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use ledgersim_common::{
    verify::{verify_peer, verify_snapshot, ChainReport},
    LedgerError, Peer, PeerId, Result,
};
use ledgersim_consensus::{BallotOutcome, QuorumPolicy, QuorumStatus, Tally};

use crate::{
    append::AppendReceipt,
    events::LedgerEvent,
    registry::{JoinOutcome, LedgerRegistry},
    storage::SnapshotPersistence,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerServiceConfig {
    pub quorum: QuorumPolicy,
    /// Messages buffered per observer before it starts losing updates.
    pub broadcast_capacity: usize,
    /// Appends from an unknown identity register that peer first.
    pub auto_register_peers: bool,
}

impl Default for LedgerServiceConfig {
    fn default() -> Self {
        Self {
            quorum: QuorumPolicy::default(),
            broadcast_capacity: 64,
            auto_register_peers: false,
        }
    }
}

/// What a registry operation did, as seen by the commit path.
struct Change<T> {
    value: T,
    changed: bool,
    notice: Option<LedgerEvent>,
}

impl<T> Change<T> {
    fn applied(value: T) -> Self {
        Self { value, changed: true, notice: None }
    }

    fn untouched(value: T) -> Self {
        Self { value, changed: false, notice: None }
    }

    fn with_notice(mut self, notice: LedgerEvent) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Single entry point for every registry command.
///
/// Mutations are serialized by the write side of one lock and follow the
/// order mutate → persist → broadcast. If persisting fails the registry is
/// restored to its previous value and the command fails, so memory and disk
/// never disagree. Queries take the read side and see whole snapshots.
pub struct LedgerService {
    registry: RwLock<LedgerRegistry>,
    store: Arc<dyn SnapshotPersistence>,
    events: broadcast::Sender<LedgerEvent>,
    auto_register_peers: bool,
}

impl LedgerService {
    /// Loads the persisted snapshot, or starts with an empty registry.
    pub fn open(store: Arc<dyn SnapshotPersistence>, config: LedgerServiceConfig) -> Result<Self> {
        let registry = match store.load()? {
            Some(peers) => {
                info!("📂 Registro restaurado do snapshot: {} peers", peers.len());
                LedgerRegistry::from_peers(peers, config.quorum)
            }
            None => {
                info!("🆕 Nenhum snapshot encontrado. Iniciando registro vazio.");
                LedgerRegistry::new(config.quorum)
            }
        };

        let (events, _) = broadcast::channel(config.broadcast_capacity.max(1));

        Ok(Self {
            registry: RwLock::new(registry),
            store,
            events,
            auto_register_peers: config.auto_register_peers,
        })
    }

    /// New observer of registry updates.
    ///
    /// A slow observer lags and loses old messages; it never holds back
    /// other observers or the next mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.events.receiver_count()
    }

    // ---- queries ----

    pub async fn fetch_all(&self) -> Vec<Peer> {
        self.registry.read().await.list_all()
    }

    pub async fn find(&self, identity: &PeerId) -> Result<Peer> {
        self.registry
            .read()
            .await
            .find(identity)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownPeer(identity.clone()))
    }

    pub async fn has_consensus(&self, index: u64) -> bool {
        self.registry.read().await.has_consensus(index)
    }

    pub async fn tally(&self, index: u64) -> Tally {
        self.registry.read().await.tally(index)
    }

    /// Tally and verdict for one index under a single read guard.
    pub async fn quorum_status(&self, index: u64) -> QuorumStatus {
        self.registry.read().await.quorum_status(index)
    }

    pub async fn policy(&self) -> QuorumPolicy {
        self.registry.read().await.policy()
    }

    /// Runs observer-side verification over one peer or the whole registry.
    pub async fn verify(&self, identity: Option<&PeerId>) -> Result<Vec<ChainReport>> {
        let registry = self.registry.read().await;
        match identity {
            Some(id) => {
                let peer = registry
                    .find(id)
                    .ok_or_else(|| LedgerError::UnknownPeer(id.clone()))?;
                Ok(vec![verify_peer(peer)])
            }
            None => Ok(verify_snapshot(registry.peers())),
        }
    }

    // ---- commands ----

    pub async fn join(&self, identity: Option<PeerId>) -> Result<JoinOutcome> {
        let outcome = self
            .commit("join", |registry| {
                let outcome = registry.join(identity);
                Ok(if outcome.created {
                    Change::applied(outcome)
                } else {
                    Change::untouched(outcome)
                })
            })
            .await?;

        if outcome.created {
            info!(target: "ledger", "EVENT:JOIN peer={} blocks={}", outcome.peer.identity, outcome.peer.len());
        } else {
            debug!("🔁 Peer [{}] reconectado", outcome.peer.identity);
        }
        Ok(outcome)
    }

    /// Removes a peer. Unknown identities are ignored.
    pub async fn leave(&self, identity: &PeerId) -> Result<bool> {
        let removed = self
            .commit("leave", |registry| {
                Ok(if registry.leave(identity) {
                    Change::applied(true)
                        .with_notice(LedgerEvent::PeerLeft { identity: identity.clone() })
                } else {
                    Change::untouched(false)
                })
            })
            .await?;

        if removed {
            info!(target: "ledger", "EVENT:LEAVE peer={}", identity);
        }
        Ok(removed)
    }

    pub async fn append(&self, identity: &PeerId, data: &str) -> Result<AppendReceipt> {
        let auto_register = self.auto_register_peers;
        let receipt = self
            .commit("append", |registry| {
                if auto_register && registry.find(identity).is_none() {
                    info!("➕ Registrando peer [{}] a partir de um append", identity);
                    registry.join(Some(identity.clone()));
                }
                registry.append(identity, data).map(Change::applied)
            })
            .await?;

        info!(
            target: "ledger",
            "EVENT:APPEND peer={} index={} hash={} skipped={}",
            identity, receipt.block.index, receipt.block.hash, receipt.skipped.len()
        );
        if receipt.is_partial() {
            warn!("⚠️ Bloco {} não replicado para peers comprometidos: {:?}", receipt.block.index, receipt.skipped);
        }
        Ok(receipt)
    }

    pub async fn confirm(&self, identity: &PeerId, index: u64) -> Result<BallotOutcome> {
        let outcome = self
            .commit("confirm", |registry| registry.confirm(identity, index).map(ballot_change))
            .await?;
        info!(target: "ledger", "EVENT:CONFIRM peer={} index={} outcome={:?}", identity, index, outcome);
        Ok(outcome)
    }

    pub async fn reject(&self, identity: &PeerId, index: u64) -> Result<BallotOutcome> {
        let outcome = self
            .commit("reject", |registry| registry.reject(identity, index).map(ballot_change))
            .await?;
        info!(target: "ledger", "EVENT:REJECT peer={} index={} outcome={:?}", identity, index, outcome);
        Ok(outcome)
    }

    pub async fn mark_tampered(&self, identity: &PeerId, index: u64) -> Result<usize> {
        let flagged = self
            .commit("mark_tampered", |registry| {
                registry.mark_tampered(identity, index).map(Change::applied)
            })
            .await?;
        warn!(target: "ledger", "EVENT:TAMPER peer={} from_index={} flagged={}", identity, index, flagged);
        Ok(flagged)
    }

    pub async fn edit_block(&self, identity: &PeerId, index: u64, data: &str) -> Result<()> {
        self.commit("edit_block", |registry| {
            registry.edit_block(identity, index, data).map(Change::applied)
        })
        .await?;
        info!(target: "ledger", "EVENT:EDIT peer={} index={}", identity, index);
        Ok(())
    }

    pub async fn rehash_block(&self, identity: &PeerId, index: u64) -> Result<String> {
        let hash = self
            .commit("rehash_block", |registry| {
                registry.rehash_block(identity, index).map(Change::applied)
            })
            .await?;
        info!(target: "ledger", "EVENT:REHASH peer={} index={} hash={}", identity, index, hash);
        Ok(hash)
    }

    pub async fn reset_peer(&self, identity: &PeerId) -> Result<()> {
        self.commit("reset_peer", |registry| registry.reset_peer(identity).map(Change::applied))
            .await?;
        info!(target: "ledger", "EVENT:RESET peer={}", identity);
        Ok(())
    }

    pub async fn reset_all(&self) -> Result<()> {
        self.commit("reset_all", |registry| {
            registry.reset_all();
            Ok(Change::applied(()))
        })
        .await?;
        info!(target: "ledger", "EVENT:RESET_ALL");
        Ok(())
    }

    /// Final persist at teardown.
    pub async fn shutdown(&self) -> Result<()> {
        let registry = self.registry.read().await;
        self.store.save(registry.peers()).map_err(as_persistence)?;
        info!("💾 Snapshot final gravado ({} peers)", registry.len());
        Ok(())
    }

    async fn commit<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut LedgerRegistry) -> Result<Change<T>>,
    {
        let mut registry = self.registry.write().await;
        let backup = registry.clone();

        let change = match f(&mut *registry) {
            Ok(change) => change,
            Err(e) => {
                *registry = backup;
                debug!("🚫 {} recusado: {}", op, e);
                return Err(e);
            }
        };

        if !change.changed {
            return Ok(change.value);
        }

        if let Err(e) = self.store.save(registry.peers()) {
            *registry = backup;
            error!("❌ Falha ao persistir snapshot após {}: {}. Alteração desfeita.", op, e);
            return Err(as_persistence(e));
        }

        if let Some(notice) = change.notice {
            self.publish(notice);
        }
        self.publish(LedgerEvent::Update { blockchain: registry.list_all() });

        Ok(change.value)
    }

    fn publish(&self, event: LedgerEvent) {
        if self.events.send(event).is_err() {
            debug!("📭 Nenhum observador conectado; broadcast descartado");
        }
    }
}

fn ballot_change(outcome: BallotOutcome) -> Change<BallotOutcome> {
    match outcome {
        BallotOutcome::Recorded => Change::applied(outcome),
        BallotOutcome::Unchanged => Change::untouched(outcome),
    }
}

fn as_persistence(err: LedgerError) -> LedgerError {
    match err {
        LedgerError::Persistence(_) => err,
        other => LedgerError::Persistence(other.to_string()),
    }
}
