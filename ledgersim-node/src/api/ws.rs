//! WebSocket transport.
//!
//! Each socket is one peer: connecting joins it (optionally with
//! `?identity=`), the socket then receives its own `welcome` followed by
//! every `update` broadcast. Several sockets may share an identity; the
//! peer is removed when the last of them closes.

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast::error::RecvError, Mutex};
use tracing::{debug, info, warn};

use ledgersim_common::{PeerId, Result};
use ledgersim_ledger::{JoinOutcome, LedgerEvent, LedgerService};

use super::rest::AppState;

/// Live sockets per identity.
///
/// Join and leave run while holding the map, so a socket closing can never
/// remove a peer that another socket has just attached to.
#[derive(Debug, Default)]
pub struct PeerConnections {
    live: Mutex<HashMap<PeerId, usize>>,
}

impl PeerConnections {
    /// Joins the peer and counts one more socket for it.
    pub async fn connect(&self, service: &LedgerService, identity: PeerId) -> Result<JoinOutcome> {
        let mut live = self.live.lock().await;
        let outcome = service.join(Some(identity)).await?;
        *live.entry(outcome.peer.identity.clone()).or_insert(0) += 1;
        Ok(outcome)
    }

    /// Drops one socket. Returns `true` when it was the last one and the
    /// peer left the registry.
    pub async fn disconnect(&self, service: &LedgerService, identity: &PeerId) -> Result<bool> {
        let mut live = self.live.lock().await;
        match live.get_mut(identity) {
            Some(count) if *count > 1 => {
                *count -= 1;
                Ok(false)
            }
            Some(_) => {
                live.remove(identity);
                service.leave(identity).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn count(&self, identity: &PeerId) -> usize {
        self.live.lock().await.get(identity).copied().unwrap_or(0)
    }
}

#[derive(Deserialize)]
pub struct ConnectParams {
    identity: Option<PeerId>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.identity))
}

async fn handle_socket(socket: WebSocket, state: AppState, identity: Option<PeerId>) {
    let (mut sender, mut receiver) = socket.split();

    // subscribe first so the update produced by our own join is not missed
    let mut updates = state.service.subscribe();

    let identity = identity.unwrap_or_else(PeerId::generate);
    let outcome = match state.connections.connect(&state.service, identity).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("❌ Conexão recusada: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    let identity = outcome.peer.identity.clone();
    info!("🔌 Peer [{}] conectado ({} observadores)", identity, state.service.observer_count());

    match LedgerEvent::welcome(&outcome.peer).to_json() {
        Ok(json) => {
            if sender.send(Message::Text(json.into())).await.is_err() {
                leave(&state, &identity).await;
                return;
            }
        }
        Err(e) => warn!("⚠️ Falha ao serializar welcome para [{}]: {}", identity, e),
    }

    let forward_id = identity.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match updates.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("🐢 Observador [{}] atrasado; {} mensagens descartadas", forward_id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!("⚠️ Falha ao serializar evento: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_id = identity.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => debug!("📨 Mensagem de [{}]: {}", recv_id, text.as_str()),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    leave(&state, &identity).await;
}

async fn leave(state: &AppState, identity: &PeerId) {
    match state.connections.disconnect(&state.service, identity).await {
        Ok(true) => info!("👋 Peer [{}] desconectado", identity),
        Ok(false) => debug!("🔌 Socket de [{}] fechado; outras conexões seguem ativas", identity),
        Err(e) => warn!("⚠️ Falha ao remover peer [{}]: {}", identity, e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledgersim_ledger::{service::LedgerServiceConfig, MemoryStore};

    use super::*;

    fn service() -> LedgerService {
        LedgerService::open(Arc::new(MemoryStore::new()), LedgerServiceConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_shared_identity_survives_first_close() {
        let service = service();
        let connections = PeerConnections::default();
        let id = PeerId::from("A");

        assert!(connections.connect(&service, id.clone()).await.unwrap().created);
        assert!(!connections.connect(&service, id.clone()).await.unwrap().created);
        assert_eq!(connections.count(&id).await, 2);

        assert!(!connections.disconnect(&service, &id).await.unwrap());
        assert!(service.find(&id).await.is_ok());

        assert!(connections.disconnect(&service, &id).await.unwrap());
        assert!(service.find(&id).await.is_err());
        assert_eq!(connections.count(&id).await, 0);
    }

    #[tokio::test]
    async fn test_reconnect_after_last_close_creates_fresh_peer() {
        let service = service();
        let connections = PeerConnections::default();
        let id = PeerId::from("A");

        connections.connect(&service, id.clone()).await.unwrap();
        connections.disconnect(&service, &id).await.unwrap();

        assert!(connections.connect(&service, id.clone()).await.unwrap().created);
        assert_eq!(connections.count(&id).await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_socket_is_noop() {
        let service = service();
        let connections = PeerConnections::default();
        service.join(Some(PeerId::from("rest-only"))).await.unwrap();

        assert!(!connections.disconnect(&service, &PeerId::from("rest-only")).await.unwrap());
        assert!(service.find(&PeerId::from("rest-only")).await.is_ok());
    }
}
