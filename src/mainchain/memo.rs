// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The main-chain payment memo encoding (spec §6 "Main-chain payment
//! encoding"): a peg-in's payment carries the 32-byte nonce hash in
//! its memo field. This is the second of the three call sites the
//! nonce hash formula must agree with (spec §9 "Nonce construction").

use crate::types::NonceHash;

pub fn encode(nonce_hash: &NonceHash) -> [u8; 32] {
    nonce_hash.0
}

pub fn decode(memo: &[u8]) -> Option<NonceHash> {
    let bytes: [u8; 32] = memo.try_into().ok()?;
    Some(NonceHash(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let nonce = crate::nonce::nonce_hash(b"genesis", 42);
        let memo = encode(&nonce);
        assert_eq!(decode(&memo), Some(nonce));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(decode(&[1, 2, 3]), None);
    }
}
