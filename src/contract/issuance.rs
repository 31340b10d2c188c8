// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Import issuance (spec §4.4): invoked by the custodian with a
//! consumed uniqueness token, emitting newly issued value whose asset
//! id is derived deterministically from `(import-contract-seed,
//! asset)`.

use crate::contract::{ConsumedToken, Seed};
use crate::types::{AssetId, Amount, SideChainPubkey};

const DOMAIN_TAG: &[u8] = b"import-issuance";

/// The result of a successful issuance: value the custodian's
/// signature authorizes paying to `recipient`.
#[derive(Debug, Clone)]
pub struct Issued {
    pub asset_id: [u8; 32],
    pub amount: Amount,
    pub recipient: SideChainPubkey,
}

#[derive(Debug, Clone, Copy)]
pub struct ImportIssuance {
    importer_seed: Seed,
}

impl ImportIssuance {
    pub fn new(importer_seed: Seed) -> Self {
        ImportIssuance { importer_seed }
    }

    /// Derives the side-chain asset id for a given underlying asset,
    /// deterministic in `(import-contract-seed, asset)` (spec §4.4).
    pub fn derived_asset_id(&self, asset: &AssetId) -> [u8; 32] {
        Seed::of(DOMAIN_TAG, &[&self.importer_seed.0, &asset.0]).0
    }

    /// Issues value for a consumed uniqueness token. The custodian's
    /// signature is the satisfying condition for the deferred
    /// obligation this produces (spec §4.4); that signature check is
    /// the side-chain VM's job and is out of this crate's scope, so it
    /// is represented here as the caller having already authenticated
    /// (enforced at the call site in [`crate::pegin::import_loop`]).
    pub fn issue(&self, token: ConsumedToken) -> Issued {
        Issued {
            asset_id: self.derived_asset_id(&token.asset),
            amount: token.amount,
            recipient: token.recipient,
        }
    }
}
