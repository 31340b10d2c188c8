// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for the data model in spec §3: peg records, export
//! records, pin cursors, and the custodian identity row.

use serde::{Deserialize, Serialize};

pub type Amount = u64;

/// A peg-in's primary identity: `VMHash("Nonce", {zero-seed, zero-seed,
/// initial-block-id, expiration-ms})`, computed once in [`crate::nonce`]
/// and reused at record time, in the main-chain memo, and at import
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonceHash(#[serde(with = "hex::serde")] pub [u8; 32]);

impl NonceHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for NonceHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Opaque binary blob interpreted by the main-chain ecosystem; this
/// crate never inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetId(#[serde(with = "base64_bytes")] pub Vec<u8>);

/// A side-chain public key. Side-chain cryptographic primitives are an
/// external collaborator (spec §1); this crate only stores and
/// compares the raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideChainPubkey(#[serde(with = "hex::serde")] pub [u8; 32]);

/// One intended peg-in (spec §3 "Peg record").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PegRecord {
    pub nonce_hash: NonceHash,
    pub recipient_pubkey: SideChainPubkey,
    pub asset: AssetId,
    pub amount: Amount,
    pub expiration_ms: i64,
    pub stellar_seen: bool,
    pub imported: bool,
}

impl PegRecord {
    /// Invariant from spec §3: a record past its expiration that was
    /// never imported is unreachable and may be garbage-collected.
    pub fn is_expired_unreachable(&self, now_ms: i64) -> bool {
        !self.imported && self.expiration_ms < now_ms
    }

    pub fn ready_to_import(&self) -> bool {
        self.stellar_seen && !self.imported
    }
}

/// The custodian's side of a peg-out (spec §3 "Export record").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    pub txid: [u8; 32],
    pub exporter: String,
    pub asset: AssetId,
    pub amount: Amount,
    pub temp_addr: String,
    pub escrow_seqnum: i64,
    pub retire_anchor: Vec<u8>,
    pub exporter_pubkey: SideChainPubkey,
    pub state: PegOutState,
}

/// The peg-out state machine from spec §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum PegOutState {
    NotYet = 0,
    Ok = 1,
    Retry = 2,
    Fail = 3,
}

impl PegOutState {
    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::NotYet),
            1 => Some(Self::Ok),
            2 => Some(Self::Retry),
            3 => Some(Self::Fail),
            _ => None,
        }
    }

    /// Export rows awaiting or eligible for retry at the condition
    /// variable's wake, per spec §4.6.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::NotYet | Self::Retry)
    }

    /// Selector for the step-2 contract transaction: OK retires,
    /// anything else refunds (spec §4.4, §9 open question).
    pub fn selector(self) -> crate::contract::export_contract::Selector {
        match self {
            Self::Ok => crate::contract::export_contract::Selector::Retire,
            _ => crate::contract::export_contract::Selector::Refund,
        }
    }
}

/// A named cursor over the side-chain block stream (spec §3 "Pin
/// cursor").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinCursor {
    pub name: &'static str,
    pub height: u64,
}

/// The single-row custodian identity table (spec §3).
#[derive(Debug, Clone)]
pub struct CustodianIdentity {
    pub seed: Vec<u8>,
    pub cursor: String,
}

pub(crate) mod base64_bytes {
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(serde::de::Error::custom)
    }
}

