// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route handlers for the HTTP surface (spec §6).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::contract::uniqueness_token::UniquenessToken;
use crate::db::Store;
use crate::mainchain::MainChainClient;
use crate::nonce::{nonce_hash, GENESIS_BLOCK_ID};
use crate::submitter::builder::RawTx;
use crate::submitter::Submitter;
use crate::types::{AssetId, SideChainPubkey};

use super::error::HttpError;

/// Request bodies block on the submitter/store for at most this long
/// before the HTTP layer surfaces a 408 (spec §6's "blocks until
/// available or request deadline").
const REQUEST_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub submitter: Arc<Submitter>,
    pub main_chain: Arc<dyn MainChainClient>,
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// `GET /account` (spec §6): the custodian's main-chain account id.
/// Real XDR account-id encoding is out of scope (spec §1); this
/// returns the id as opaque bytes.
pub async fn account(State(state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let id = state.main_chain.account_id().await?;
    Ok(([(axum::http::header::CONTENT_TYPE, "application/octet-stream")], id.into_bytes()))
}

#[derive(Deserialize)]
pub struct GetBlockQuery {
    #[serde(default)]
    height: Option<u64>,
}

/// `GET /get?height=H` (spec §6): H=0 or omitted means current head.
pub async fn get_block(
    State(state): State<AppState>,
    Query(query): Query<GetBlockQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let height = query.height.unwrap_or(0);
    let bits = state.submitter.get_block(height, REQUEST_DEADLINE).await?;
    Ok(([(axum::http::header::CONTENT_TYPE, "application/octet-stream")], bits))
}

#[derive(Deserialize)]
pub struct SubmitQuery {
    #[serde(default)]
    wait: u8,
}

/// `POST /submit?wait=[0,1]` (spec §6): body is the opaque side-chain
/// raw transaction; `wait=1` blocks until it is observed in a
/// committed block.
pub async fn submit(
    State(state): State<AppState>,
    Query(query): Query<SubmitQuery>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, HttpError> {
    if body.is_empty() {
        return Err(crate::Error::malformed("empty transaction body").into());
    }
    let bytes = body.to_vec();
    let id = tx_id(&bytes);
    let tx = RawTx { id: id.clone(), bytes };
    let subscriber = state.submitter.submit(tx).await;

    if query.wait == 1 {
        let (_tx, cancel) = tokio::sync::watch::channel(false);
        tokio::time::timeout(REQUEST_DEADLINE, state.submitter.wait_for_tx(&id, subscriber, cancel))
            .await
            .map_err(|_| crate::Error::Cancelled)??;
    }
    Ok(StatusCode::NO_CONTENT)
}

fn tx_id(bytes: &[u8]) -> Vec<u8> {
    let mut hasher = blake2b_simd::Params::new().hash_length(32).to_state();
    hasher.update(bytes);
    hasher.finalize().as_bytes().to_vec()
}

#[derive(Deserialize)]
pub struct PegInRequest {
    #[serde(with = "crate::types::base64_bytes")]
    prepeg_tx: Vec<u8>,
    amount: crate::types::Amount,
    asset_xdr: AssetId,
    #[serde(with = "hex::serde")]
    recip_pubkey: [u8; 32],
    exp_ms: i64,
}

#[derive(Deserialize)]
pub struct RecordPegInRequest {
    amount: crate::types::Amount,
    asset_xdr: AssetId,
    #[serde(with = "hex::serde")]
    recip_pubkey: [u8; 32],
    exp_ms: i64,
}

#[derive(Serialize)]
pub struct PegInResponse {
    nonce_hash: String,
}

/// `POST /peg-in` (spec §6, §4.5): submits the caller's pre-peg
/// transaction, awaits inclusion, then writes the peg row.
pub async fn peg_in(
    State(state): State<AppState>,
    Json(req): Json<PegInRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let nonce = nonce_hash(GENESIS_BLOCK_ID, req.exp_ms);
    let token = UniquenessToken::new(req.asset_xdr, req.amount, SideChainPubkey(req.recip_pubkey), nonce);
    let id = tx_id(&req.prepeg_tx);
    let tx = RawTx { id, bytes: req.prepeg_tx };
    crate::pegin::record_peg_in(&state.store, &state.submitter, Some(tx), token, req.exp_ms).await?;
    Ok(Json(PegInResponse { nonce_hash: nonce.to_string() }))
}

/// `POST /record-peg-in` (spec §6): assumes the caller already
/// submitted the pre-peg transaction; inserts the peg row only.
pub async fn record_peg_in(
    State(state): State<AppState>,
    Json(req): Json<RecordPegInRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let nonce = nonce_hash(GENESIS_BLOCK_ID, req.exp_ms);
    let token = UniquenessToken::new(req.asset_xdr, req.amount, SideChainPubkey(req.recip_pubkey), nonce);
    crate::pegin::record_peg_in(&state.store, &state.submitter, None, token, req.exp_ms).await?;
    Ok(Json(PegInResponse { nonce_hash: nonce.to_string() }))
}
