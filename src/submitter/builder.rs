// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The in-flight block builder (spec §4.2): accumulates submitted
//! transactions until the commit timer fires. Owned exclusively by
//! the [`crate::submitter::Submitter`] (spec §9 "Ownership of
//! side-chain state") — nothing outside this module mutates its
//! fields.

use blake2b_simd::Params;

/// A raw side-chain transaction, opaque bytes conforming to the
/// external VM's protobuf encoding (spec §6); this crate never
/// decodes it, except for the single leading tag byte this crate's own
/// templates (§4.4) use to recognize their own log entries among
/// otherwise-opaque payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTx {
    pub id: Vec<u8>,
    pub bytes: Vec<u8>,
}

/// Leading tag byte identifying the kind of in-scope transaction a
/// payload encodes, so the retire watcher (spec §4.6) can pick its own
/// templates' log entries out of a block without interpreting the
/// side-chain VM's general transaction format.
pub const TAG_ISSUANCE: u8 = 1;
pub const TAG_EXPORT_STEP1: u8 = 2;
pub const TAG_EXPORT_STEP2: u8 = 3;

/// Splits a committed block's `bits` back into its individual
/// transaction payloads, inverting the length-prefixed concatenation
/// [`BlockBuilder::commit`] produces.
pub fn decode_bits(bits: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut rest = bits;
    while rest.len() >= 4 {
        let (len_bytes, tail) = rest.split_at(4);
        let len = u32::from_be_bytes(len_bytes.try_into().unwrap()) as usize;
        if tail.len() < len {
            break;
        }
        let (payload, tail) = tail.split_at(len);
        out.push(payload.to_vec());
        rest = tail;
    }
    out
}

pub(crate) struct BlockBuilder {
    pub height: u64,
    pub pending: Vec<RawTx>,
}

impl BlockBuilder {
    pub fn new(height: u64) -> Self {
        BlockBuilder {
            height,
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, tx: RawTx) {
        self.pending.push(tx);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Builds the unsigned block's bytes and hash. The real side-chain
    /// VM would apply this to its authoritative chain and produce a
    /// new contract-set/nonce-set snapshot commitment (spec §3); since
    /// that VM is an external collaborator (spec §1), this crate
    /// models the snapshot as a deterministic hash over the block's
    /// transaction ids, sufficient to exercise the store/broadcast/pin
    /// machinery end-to-end.
    pub fn commit(self) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        let mut block_bytes = Vec::new();
        for tx in &self.pending {
            block_bytes.extend_from_slice(&(tx.bytes.len() as u32).to_be_bytes());
            block_bytes.extend_from_slice(&tx.bytes);
        }

        let mut hasher = Params::new().hash_length(32).to_state();
        hasher.update(&self.height.to_be_bytes());
        hasher.update(&block_bytes);
        let hash = hasher.finalize().as_bytes().to_vec();

        let mut snapshot_hasher = Params::new().hash_length(32).to_state();
        snapshot_hasher.update(b"snapshot");
        snapshot_hasher.update(&hash);
        for tx in &self.pending {
            snapshot_hasher.update(&tx.id);
        }
        let snapshot = snapshot_hasher.finalize().as_bytes().to_vec();

        (hash, block_bytes, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_has_no_pending() {
        let builder = BlockBuilder::new(1);
        assert!(builder.is_empty());
    }

    #[test]
    fn commit_is_deterministic_over_same_pending_set() {
        let mut a = BlockBuilder::new(7);
        a.push(RawTx { id: vec![1], bytes: vec![9, 9] });
        let mut b = BlockBuilder::new(7);
        b.push(RawTx { id: vec![1], bytes: vec![9, 9] });
        assert_eq!(a.commit(), b.commit());
    }

    #[test]
    fn decode_bits_inverts_commit_encoding() {
        let mut builder = BlockBuilder::new(1);
        builder.push(RawTx { id: vec![1], bytes: vec![1, 2, 3] });
        builder.push(RawTx { id: vec![2], bytes: vec![] });
        builder.push(RawTx { id: vec![3], bytes: vec![9; 40] });
        let (_, bits, _) = builder.commit();
        let payloads = decode_bits(&bits);
        assert_eq!(payloads, vec![vec![1, 2, 3], vec![], vec![9; 40]]);
    }
}
