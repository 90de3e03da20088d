//! Route definitions for the gateway stub.
//!
//! Implements the endpoints that `fgate-gateway`'s `HttpGateway` calls,
//! with response bodies that decode cleanly into its wire types.

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fgate_core::CommitStatus;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::store::StubState;

const TOKEN_HEADER: &str = "x-ffs-token";

/// Build the complete router with all gateway stub routes.
pub fn router(state: StubState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ffs/create", post(ffs_create))
        .route("/ffs/hot", post(ffs_hot))
        .route("/ffs/push/{cid}", post(ffs_push))
        .route("/ffs/info/{cid}", get(ffs_info))
        .route("/ffs/get/{cid}", get(ffs_get))
        .fallback(not_implemented)
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Content identifier the stub assigns to `data`: `bafk` + SHA-256 hex.
pub fn content_id(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("bafk{hex}")
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> StatusCode {
    StatusCode::OK
}

// ── Namespaces ──────────────────────────────────────────────────────

async fn ffs_create(State(state): State<StubState>) -> Response {
    let id = Uuid::new_v4().to_string();
    let token = Uuid::new_v4().simple().to_string();
    state.namespaces().insert(token.clone(), id.clone());
    tracing::info!(file_system_id = %id, "created namespace");
    Json(json!({ "id": id, "token": token })).into_response()
}

fn namespace(state: &StubState, headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|token| state.namespace_for(token))
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, "unknown or missing token").into_response())
}

// ── Content ─────────────────────────────────────────────────────────

async fn ffs_hot(State(state): State<StubState>, headers: HeaderMap, body: Bytes) -> Response {
    let ns = match namespace(&state, &headers) {
        Ok(ns) => ns,
        Err(resp) => return resp,
    };
    let cid = content_id(&body);
    let key = (ns, cid.clone());
    let size = body.len();
    state.content().insert(key.clone(), body);
    state.status().entry(key).or_insert(CommitStatus::Pending);
    tracing::info!(cid = %cid, size, "added to hot set");
    Json(json!({ "cid": cid })).into_response()
}

async fn ffs_push(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(cid): Path<String>,
) -> Response {
    let ns = match namespace(&state, &headers) {
        Ok(ns) => ns,
        Err(resp) => return resp,
    };
    let key = (ns, cid);
    if !state.content().contains_key(&key) {
        return (StatusCode::NOT_FOUND, "cid not in hot set").into_response();
    }
    state.status().insert(key, state.commit_outcome());
    StatusCode::OK.into_response()
}

async fn ffs_info(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(cid): Path<String>,
) -> Response {
    let ns = match namespace(&state, &headers) {
        Ok(ns) => ns,
        Err(resp) => return resp,
    };
    let status = match state.status().get(&(ns, cid.clone())) {
        Some(s) => *s,
        None => return (StatusCode::NOT_FOUND, "cid not found").into_response(),
    };
    let message = (status == CommitStatus::Failed).then_some("commitment failed");
    Json(json!({ "cid": cid, "status": status.as_str(), "message": message })).into_response()
}

async fn ffs_get(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(cid): Path<String>,
) -> Response {
    let ns = match namespace(&state, &headers) {
        Ok(ns) => ns,
        Err(resp) => return resp,
    };
    match state.content().get(&(ns, cid)) {
        Some(data) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            Body::from(data.clone()),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "cid not found").into_response(),
    }
}

// ── Fallback ────────────────────────────────────────────────────────

async fn not_implemented() -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({ "error": "endpoint not implemented in gateway stub" })),
    )
        .into_response()
}
