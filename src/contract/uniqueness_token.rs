// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The uniqueness token (spec §4.4): created by the user on the side
//! chain before broadcasting the main-chain payment, consumable
//! exactly once by the import-issuance contract. This is what gives a
//! peg-in at-most-once import semantics (spec §8 property 2).

use crate::contract::{ConsumedToken, Seed};
use crate::types::{Amount, AssetId, NonceHash, SideChainPubkey};

const DOMAIN_TAG: &[u8] = b"uniqueness-token";

#[derive(Debug, Clone)]
pub struct UniquenessToken {
    pub asset: AssetId,
    pub amount: Amount,
    pub recipient: SideChainPubkey,
    pub nonce_hash: NonceHash,
}

impl UniquenessToken {
    pub fn new(asset: AssetId, amount: Amount, recipient: SideChainPubkey, nonce_hash: NonceHash) -> Self {
        UniquenessToken {
            asset,
            amount,
            recipient,
            nonce_hash,
        }
    }

    /// Content-derived seed. Only callable by the import-issuance
    /// contract, enforced in the real VM by seed equality (spec §4.4)
    /// — here that check is performed by
    /// [`super::issuance::ImportIssuance::issue`], which requires the
    /// caller to hand back this exact seed.
    pub fn seed(&self) -> Seed {
        Seed::of(
            DOMAIN_TAG,
            &[
                &self.asset.0,
                &self.amount.to_be_bytes(),
                &self.recipient.0,
                &self.nonce_hash.0,
            ],
        )
    }

    /// Consumes the token, moving its encoded fields into the caller's
    /// argument area. A token can only be consumed once because `self`
    /// is moved by value — there is no way to call this twice on the
    /// same token.
    pub fn consume(self) -> ConsumedToken {
        ConsumedToken {
            asset: self.asset.clone(),
            amount: self.amount,
            recipient: self.recipient,
            nonce_hash: self.nonce_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UniquenessToken {
        UniquenessToken::new(
            AssetId(b"native".to_vec()),
            100,
            SideChainPubkey([7u8; 32]),
            crate::nonce::nonce_hash(b"genesis", 1700),
        )
    }

    #[test]
    fn seed_is_deterministic_over_fields() {
        let a = sample();
        let b = sample();
        assert_eq!(a.seed(), b.seed());
    }

    #[test]
    fn different_amount_changes_seed() {
        let a = sample();
        let mut b = sample();
        b.amount = 101;
        assert_ne!(a.seed(), b.seed());
    }

    #[test]
    fn consume_yields_the_five_encoded_fields() {
        let token = sample();
        let nonce = token.nonce_hash;
        let consumed = token.consume();
        assert_eq!(consumed.amount, 100);
        assert_eq!(consumed.nonce_hash, nonce);
    }
}
