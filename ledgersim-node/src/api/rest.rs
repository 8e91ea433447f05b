use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use ledgersim_common::{verify::ChainReport, Block, Peer, PeerId};
use ledgersim_consensus::{BallotOutcome, QuorumStatus};
use ledgersim_ledger::{AppendReceipt, LedgerService};

use super::{
    error::ApiError,
    ws::{ws_handler, PeerConnections},
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LedgerService>,
    pub connections: Arc<PeerConnections>,
}

impl AppState {
    pub fn new(service: Arc<LedgerService>) -> Self {
        Self {
            service,
            connections: Arc::new(PeerConnections::default()),
        }
    }
}

#[derive(Deserialize)]
struct AppendRequest {
    identity: PeerId,
    data: String,
}

#[derive(Deserialize)]
struct BlockRef {
    identity: PeerId,
    index: u64,
}

#[derive(Deserialize)]
struct EditRequest {
    identity: PeerId,
    index: u64,
    data: String,
}

#[derive(Deserialize, Default)]
struct IdentityParams {
    identity: Option<PeerId>,
}

#[derive(Serialize)]
struct VoteResponse {
    identity: PeerId,
    index: u64,
    outcome: BallotOutcome,
}

#[derive(Serialize)]
struct TamperResponse {
    identity: PeerId,
    index: u64,
    flagged: usize,
}

#[derive(Serialize)]
struct RehashResponse {
    identity: PeerId,
    index: u64,
    hash: String,
}

#[derive(Serialize)]
struct JoinResponse {
    identity: PeerId,
    blocks: Vec<Block>,
    created: bool,
}

#[derive(Serialize)]
struct Ack {
    message: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/blocks", get(list_blocks_api).post(append_block_api))
        .route("/confirm", post(confirm_block_api))
        .route("/reject", post(reject_block_api))
        .route("/tamper", post(tamper_block_api))
        .route("/edit", post(edit_block_api))
        .route("/rehash", post(rehash_block_api))
        .route("/reset", post(reset_api))
        .route("/verify", get(verify_api))
        .route("/consensus/{index}", get(consensus_api))
        .route("/peers", post(join_api))
        .route("/peers/{identity}", get(get_peer_api).delete(leave_api))
        .route("/ws", get(ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Serves the API until `shutdown` resolves.
pub async fn start_rest_api<F>(addr: &str, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("REST API + WebSocket listening on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}

async fn list_blocks_api(State(state): State<AppState>) -> Json<Vec<Peer>> {
    Json(state.service.fetch_all().await)
}

async fn get_peer_api(
    State(state): State<AppState>,
    Path(identity): Path<PeerId>,
) -> Result<Json<Peer>, ApiError> {
    Ok(Json(state.service.find(&identity).await?))
}

async fn append_block_api(
    State(state): State<AppState>,
    Json(req): Json<AppendRequest>,
) -> Result<Json<AppendReceipt>, ApiError> {
    Ok(Json(state.service.append(&req.identity, &req.data).await?))
}

async fn confirm_block_api(
    State(state): State<AppState>,
    Json(req): Json<BlockRef>,
) -> Result<Json<VoteResponse>, ApiError> {
    let outcome = state.service.confirm(&req.identity, req.index).await?;
    Ok(Json(VoteResponse { identity: req.identity, index: req.index, outcome }))
}

async fn reject_block_api(
    State(state): State<AppState>,
    Json(req): Json<BlockRef>,
) -> Result<Json<VoteResponse>, ApiError> {
    let outcome = state.service.reject(&req.identity, req.index).await?;
    Ok(Json(VoteResponse { identity: req.identity, index: req.index, outcome }))
}

async fn tamper_block_api(
    State(state): State<AppState>,
    Json(req): Json<BlockRef>,
) -> Result<Json<TamperResponse>, ApiError> {
    let flagged = state.service.mark_tampered(&req.identity, req.index).await?;
    Ok(Json(TamperResponse { identity: req.identity, index: req.index, flagged }))
}

async fn edit_block_api(
    State(state): State<AppState>,
    Json(req): Json<EditRequest>,
) -> Result<Json<Ack>, ApiError> {
    state.service.edit_block(&req.identity, req.index, &req.data).await?;
    Ok(Json(Ack {
        message: format!("Block {} of {} edited", req.index, req.identity),
    }))
}

async fn rehash_block_api(
    State(state): State<AppState>,
    Json(req): Json<BlockRef>,
) -> Result<Json<RehashResponse>, ApiError> {
    let hash = state.service.rehash_block(&req.identity, req.index).await?;
    Ok(Json(RehashResponse { identity: req.identity, index: req.index, hash }))
}

/// With an identity, resyncs that peer; without one, resets every peer.
async fn reset_api(
    State(state): State<AppState>,
    body: Option<Json<IdentityParams>>,
) -> Result<Json<Ack>, ApiError> {
    let Json(params) = body.unwrap_or_default();
    let message = match params.identity {
        Some(identity) => {
            state.service.reset_peer(&identity).await?;
            format!("Peer {} reset", identity)
        }
        None => {
            state.service.reset_all().await?;
            "All peers reset to genesis".to_string()
        }
    };
    Ok(Json(Ack { message }))
}

async fn verify_api(
    State(state): State<AppState>,
    Query(params): Query<IdentityParams>,
) -> Result<Json<Vec<ChainReport>>, ApiError> {
    Ok(Json(state.service.verify(params.identity.as_ref()).await?))
}

async fn consensus_api(
    State(state): State<AppState>,
    Path(index): Path<u64>,
) -> Json<QuorumStatus> {
    Json(state.service.quorum_status(index).await)
}

async fn join_api(
    State(state): State<AppState>,
    body: Option<Json<IdentityParams>>,
) -> Result<Json<JoinResponse>, ApiError> {
    let Json(params) = body.unwrap_or_default();
    let outcome = state.service.join(params.identity).await?;
    Ok(Json(JoinResponse {
        identity: outcome.peer.identity,
        blocks: outcome.peer.blocks,
        created: outcome.created,
    }))
}

async fn leave_api(
    State(state): State<AppState>,
    Path(identity): Path<PeerId>,
) -> Result<Json<Ack>, ApiError> {
    let removed = state.service.leave(&identity).await?;
    let message = if removed {
        format!("Peer {} left", identity)
    } else {
        format!("Peer {} was not registered", identity)
    };
    Ok(Json(Ack { message }))
}
