// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two-step export / retire-or-refund contract (spec §4.4). Step 1
//! is user-built: it spends the user's value, splits change back to
//! the user, and parks the retire amount under a reference to the
//! export record. Step 2 is custodian-built, after main-chain
//! settlement: a selector picks retire or refund. Both steps require
//! the custodian's signature, represented here by the caller already
//! having authenticated (the side-chain VM's signature-check mechanism
//! is out of scope, per spec §1).

use crate::types::{Amount, AssetId};

/// selector = 1 retires the parked value; selector = 0 refunds it to
/// the exporter (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Retire,
    Refund,
}

impl Selector {
    pub fn as_i64(self) -> i64 {
        match self {
            Selector::Retire => 1,
            Selector::Refund => 0,
        }
    }
}

/// The JSON export reference parked by step 1, matching the wire shape
/// in spec §4.4 (`{asset, temp, seqnum, exporter, amount, anchor,
/// pubkey}`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExportReference {
    pub asset: AssetId,
    pub temp: String,
    pub seqnum: i64,
    pub exporter: String,
    pub amount: Amount,
    pub anchor: Vec<u8>,
    pub pubkey: [u8; 32],
}

/// Step 1: the user-built transaction that splits off change and
/// parks the retire amount under this reference.
#[derive(Debug, Clone)]
pub struct ExportStep1 {
    pub reference: ExportReference,
    /// Change returned to the user's own side-chain account,
    /// conserving `value in - value out = retired - refunded -
    /// change` (spec §4.4 "Conservation").
    pub change: Amount,
}

/// Step 2: the custodian-built finalization transaction, submitted
/// after main-chain settlement completes (spec §4.6 "Settlement
/// watcher").
#[derive(Debug, Clone)]
pub struct ExportStep2 {
    pub reference: ExportReference,
    pub selector: Selector,
}

impl ExportStep2 {
    pub fn from_settlement(reference: ExportReference, state: crate::types::PegOutState) -> Self {
        ExportStep2 {
            reference,
            selector: state.selector(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PegOutState;

    fn reference() -> ExportReference {
        ExportReference {
            asset: AssetId(b"native".to_vec()),
            temp: "GTEMP".to_string(),
            seqnum: 42,
            exporter: "GEXPORTER".to_string(),
            amount: 50,
            anchor: vec![1, 2, 3],
            pubkey: [9u8; 32],
        }
    }

    #[test]
    fn ok_state_selects_retire() {
        let step2 = ExportStep2::from_settlement(reference(), PegOutState::Ok);
        assert_eq!(step2.selector, Selector::Retire);
        assert_eq!(step2.selector.as_i64(), 1);
    }

    #[test]
    fn fail_state_selects_refund() {
        let step2 = ExportStep2::from_settlement(reference(), PegOutState::Fail);
        assert_eq!(step2.selector, Selector::Refund);
        assert_eq!(step2.selector.as_i64(), 0);
    }
}
