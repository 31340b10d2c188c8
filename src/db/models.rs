// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row <-> domain type mapping for the persisted layout in spec §6.

use sqlx::FromRow;

use crate::types::{AssetId, ExportRecord, NonceHash, PegOutState, PegRecord, SideChainPubkey};

fn decode_err(field: &str, msg: &str) -> crate::Error {
    crate::Error::Database(sqlx::Error::Protocol(format!("{field}: {msg}")))
}

fn fixed_bytes<const N: usize>(field: &str, v: Vec<u8>) -> crate::Result<[u8; N]> {
    v.try_into()
        .map_err(|_| decode_err(field, &format!("expected {N} bytes")))
}

#[derive(FromRow)]
pub struct PegRow {
    pub nonce_hash: Vec<u8>,
    pub amount: i64,
    pub asset_xdr: Vec<u8>,
    pub recipient_pubkey: Vec<u8>,
    pub nonce_expms: i64,
    pub imported: i64,
    pub stellar_tx: i64,
}

impl TryFrom<PegRow> for PegRecord {
    type Error = crate::Error;

    fn try_from(row: PegRow) -> crate::Result<Self> {
        Ok(PegRecord {
            nonce_hash: NonceHash(fixed_bytes("nonce_hash", row.nonce_hash)?),
            recipient_pubkey: SideChainPubkey(fixed_bytes("recipient_pubkey", row.recipient_pubkey)?),
            asset: AssetId(row.asset_xdr),
            amount: row.amount as u64,
            expiration_ms: row.nonce_expms,
            stellar_seen: row.stellar_tx != 0,
            imported: row.imported != 0,
        })
    }
}

#[derive(FromRow)]
pub struct ExportRow {
    pub txid: Vec<u8>,
    pub exporter: String,
    pub amount: i64,
    pub asset_xdr: Vec<u8>,
    pub temp_addr: String,
    pub seqnum: i64,
    pub anchor: Vec<u8>,
    pub pubkey: Vec<u8>,
    pub pegged_out: i64,
}

impl TryFrom<ExportRow> for ExportRecord {
    type Error = crate::Error;

    fn try_from(row: ExportRow) -> crate::Result<Self> {
        let state = PegOutState::from_i64(row.pegged_out)
            .ok_or_else(|| decode_err("pegged_out", "unknown peg-out state"))?;
        Ok(ExportRecord {
            txid: fixed_bytes("txid", row.txid)?,
            exporter: row.exporter,
            asset: AssetId(row.asset_xdr),
            amount: row.amount as u64,
            temp_addr: row.temp_addr,
            escrow_seqnum: row.seqnum,
            retire_anchor: row.anchor,
            exporter_pubkey: SideChainPubkey(fixed_bytes("pubkey", row.pubkey)?),
            state,
        })
    }
}
