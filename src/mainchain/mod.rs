// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The main-chain boundary. The main-chain transaction builder,
//! signer, and REST/streaming client are an external collaborator
//! (spec §1); this module defines the trait the peg-in watcher and
//! peg-out loop depend on, plus a `reqwest`-based reference
//! implementation sufficient to drive the reconciliation core against
//! a JSON HTTP stand-in for a Horizon-like API. It does not attempt
//! real XDR encoding or account signing.

pub mod memo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Amount, AssetId, NonceHash};
use crate::Result;

/// One payment operation observed on the main-chain stream, destined
/// to the custodian account (spec §4.5 "Main-chain watcher").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingPayment {
    pub cursor: String,
    pub destination: String,
    pub amount: Amount,
    pub asset: AssetId,
    pub memo_nonce_hash: Option<NonceHash>,
}

/// Outcome of a main-chain peg-out settlement submission (spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Success,
    BadSequence,
    Other(String),
}

#[async_trait]
pub trait MainChainClient: Send + Sync {
    /// The custodian's main-chain account id.
    async fn account_id(&self) -> Result<String>;

    /// Streams incoming payments to the custodian account starting
    /// just after `cursor`. Transient network/stream errors are the
    /// caller's responsibility to retry (spec §4.5, §7).
    async fn stream_payments(&self, cursor: &str) -> Result<Vec<IncomingPayment>>;

    /// Submits a peg-out settlement: merges the temporary escrow
    /// account (residue to the exporter) and pays the exported amount
    /// from the custodian to the exporter, using `escrow_seqnum + 1`
    /// (spec §4.6).
    async fn submit_settlement(
        &self,
        temp_addr: &str,
        exporter: &str,
        asset: &AssetId,
        amount: Amount,
        escrow_seqnum: i64,
    ) -> Result<SettlementOutcome>;
}

/// Reference implementation against a JSON HTTP endpoint. Real
/// Horizon-style streaming/XDR/signing is out of scope (spec §1); this
/// client models just enough of the wire shape to be a believable
/// collaborator boundary.
pub struct HttpMainChainClient {
    base_url: String,
    account: String,
    client: reqwest::Client,
}

impl HttpMainChainClient {
    pub fn new(base_url: impl Into<String>, account: impl Into<String>) -> Self {
        HttpMainChainClient {
            base_url: base_url.into(),
            account: account.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MainChainClient for HttpMainChainClient {
    async fn account_id(&self) -> Result<String> {
        Ok(self.account.clone())
    }

    async fn stream_payments(&self, cursor: &str) -> Result<Vec<IncomingPayment>> {
        let url = format!(
            "{}/accounts/{}/payments?cursor={}",
            self.base_url, self.account, cursor
        );
        let payments: Vec<IncomingPayment> = self
            .client
            .get(url)
            .send()
            .await
            .map_err(crate::Error::transient)?
            .json()
            .await
            .map_err(crate::Error::transient)?;
        Ok(payments)
    }

    async fn submit_settlement(
        &self,
        temp_addr: &str,
        exporter: &str,
        asset: &AssetId,
        amount: Amount,
        escrow_seqnum: i64,
    ) -> Result<SettlementOutcome> {
        #[derive(Serialize)]
        struct Req<'a> {
            temp_addr: &'a str,
            exporter: &'a str,
            asset: &'a AssetId,
            amount: Amount,
            seqnum: i64,
        }
        #[derive(Deserialize)]
        struct Resp {
            outcome: String,
        }
        let url = format!("{}/settlements", self.base_url);
        let resp = self
            .client
            .post(url)
            .json(&Req {
                temp_addr,
                exporter,
                asset,
                amount,
                seqnum: escrow_seqnum + 1,
            })
            .send()
            .await
            .map_err(crate::Error::transient)?
            .json::<Resp>()
            .await
            .map_err(crate::Error::transient)?;
        Ok(match resp.outcome.as_str() {
            "success" => SettlementOutcome::Success,
            "tx_bad_seq" => SettlementOutcome::BadSequence,
            other => SettlementOutcome::Other(other.to_string()),
        })
    }
}
