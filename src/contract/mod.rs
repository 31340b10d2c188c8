// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The side-chain contract protocol, treated at the level of logical
//! guarantees (spec §4.4) rather than as a VM bytecode interpreter —
//! the side-chain VM and its cryptographic primitives are an external
//! collaborator (spec §1). Each template is modeled as data plus a
//! deterministic seed hash; "executing" a template means consuming the
//! Rust value and producing the next template's inputs, mirroring the
//! spec's description of value flowing between templates rather than
//! bytes flowing through a VM.

pub mod export_contract;
pub mod issuance;
pub mod uniqueness_token;

use crate::types::{AssetId, SideChainPubkey};

/// A template's content-derived identity, standing in for the side-
/// chain VM's "compile this template to its seed" step (spec §9
/// "Graph-shaped contract templates").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed(pub [u8; 32]);

impl Seed {
    pub fn of(domain_tag: &[u8], fields: &[&[u8]]) -> Self {
        let mut params = blake2b_simd::Params::new();
        params.hash_length(32);
        params.key(domain_tag);
        let mut state = params.to_state();
        for f in fields {
            state.update(&(f.len() as u64).to_be_bytes());
            state.update(f);
        }
        let hash = state.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(hash.as_bytes());
        Seed(out)
    }
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// The five logical fields encoded by a consumed uniqueness token,
/// moved into the import-issuance contract's argument area (spec
/// §4.4 "Consumption moves its five encoded items").
#[derive(Debug, Clone)]
pub struct ConsumedToken {
    pub asset: AssetId,
    pub amount: crate::types::Amount,
    pub recipient: SideChainPubkey,
    pub nonce_hash: crate::types::NonceHash,
}

/// Resolves the uniqueness-token and import-issuance seeds bottom-up:
/// the token's seed depends only on its own byte content, and the
/// issuance template is the *caller* of the token at the byte level,
/// never the reverse, so there is always a fixpoint (spec §9). Panics
/// only on a template-authoring bug (an issuance template built before
/// its token exists), never on data received from an external source.
pub fn build_templates(
    token: uniqueness_token::UniquenessToken,
) -> (Seed, uniqueness_token::UniquenessToken) {
    let seed = token.seed();
    (seed, token)
}
