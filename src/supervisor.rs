// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The custodian supervisor (spec §4.7): boot sequence, crash
//! recovery, and task supervision. `Supervisor::run` starts every
//! background task named in spec §5 and terminates the whole process
//! the moment any one of them returns, fatal or not.

use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use tokio::sync::{mpsc, watch, Notify};
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::db::Store;
use crate::mainchain::MainChainClient;
use crate::pegout::FINALIZATION_CHANNEL_CAPACITY;
use crate::pin;
use crate::submitter::Submitter;
use crate::types::CustodianIdentity;
use crate::Result;

pub struct Supervisor {
    pub store: Store,
    pub submitter: Arc<Submitter>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl Supervisor {
    /// Boot sequence (spec §4.7): open the store, load or create the
    /// custodian identity, and recover the submitter's authoritative
    /// side-chain object from the latest snapshot. Block replay past
    /// the snapshot is a no-op in this crate's model, since the
    /// snapshot commitment already folds in every transaction id up to
    /// its height (spec §4.1); a real side-chain VM would instead
    /// replay each block's transactions against the snapshot's state.
    #[instrument(skip(config))]
    pub async fn boot(config: &Config) -> Result<Self> {
        info!(stage = "store", db = %config.db, "opening store");
        let store = Store::open(&config.db).await?;

        if store.load_custodian().await?.is_none() {
            info!(stage = "custodian", "no custodian identity found, creating one");
            let mut seed = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut seed);
            store
                .create_custodian(&CustodianIdentity { seed: seed.to_vec(), cursor: String::new() })
                .await?;
        }

        info!(stage = "submitter", "recovering side-chain state");
        let submitter = Submitter::new(store.clone(), config.block_interval);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        Ok(Supervisor { store, submitter, cancel_tx, cancel_rx })
    }

    /// Signals every task to stop at its next cancellation check
    /// point. Used by tests; the daemon binary relies on process exit
    /// instead (spec §4.7's "a fatal error in any loop terminates the
    /// process").
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Starts, in order, the submitter's commit timer (already armed
    /// lazily by `submit`), the pin runners, and the four peg-in/
    /// peg-out loops (spec §4.7), then blocks until the first one
    /// exits.
    #[instrument(skip(self, config, main_chain))]
    pub async fn run(self, config: Config, main_chain: Arc<dyn MainChainClient>) -> Result<()> {
        let pegin_notify = Arc::new(Notify::new());
        let pegout_notify = Arc::new(Notify::new());
        let (finalize_tx, finalize_rx) = mpsc::channel(FINALIZATION_CHANNEL_CAPACITY);

        info!(stage = "recovery", "re-emitting unfinalized exports");
        crate::pegout::settlement_watcher::reemit_unfinalized(&self.store, &finalize_tx).await?;

        info!(stage = "pins", "starting pin runners");
        let exports_pin = tokio::spawn(pin::run(
            "exports",
            self.store.clone(),
            self.submitter.clone(),
            crate::pegout::retire_watcher::RetireWatcher::new(self.store.clone(), pegout_notify.clone()),
            self.cancel_rx.clone(),
        ));

        info!(stage = "pegin", "starting peg-in pipeline");
        let watcher = tokio::spawn(crate::pegin::watcher::run(
            self.store.clone(),
            main_chain.clone(),
            pegin_notify.clone(),
            config.backoff_base_ms,
            self.cancel_rx.clone(),
        ));
        let import_loop = tokio::spawn(crate::pegin::import_loop::run(
            self.store.clone(),
            self.submitter.clone(),
            pegin_notify,
            self.cancel_rx.clone(),
        ));

        info!(stage = "pegout", "starting peg-out pipeline");
        let pegout_loop = tokio::spawn(crate::pegout::pegout_loop::run(
            self.store.clone(),
            main_chain,
            pegout_notify,
            finalize_tx,
            self.cancel_rx.clone(),
        ));
        let settlement_watcher = tokio::spawn(crate::pegout::settlement_watcher::run(
            self.store.clone(),
            self.submitter.clone(),
            finalize_rx,
            self.cancel_rx.clone(),
        ));

        info!(stage = "gc", "starting block garbage collector");
        let gc = tokio::spawn(gc_loop(self.store.clone(), config.gc_interval, self.cancel_rx.clone()));

        let result = tokio::select! {
            r = exports_pin => flatten(r, "exports pin"),
            r = watcher => flatten(r, "main-chain watcher"),
            r = import_loop => flatten(r, "import loop"),
            r = pegout_loop => flatten(r, "peg-out loop"),
            r = settlement_watcher => flatten(r, "settlement watcher"),
            r = gc => flatten(r, "gc loop"),
        };

        self.cancel();
        if let Err(err) = &result {
            if matches!(err, crate::Error::Cancelled) {
                // clean shutdown, nothing to log
            } else if err.is_fatal() {
                error!(%err, "fatal: a supervised task exited, terminating");
            } else {
                warn!(%err, "a supervised task exited on a non-fatal error, terminating anyway");
            }
        }
        result
    }
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>, task: &str) -> Result<()> {
    match joined {
        Ok(result) => result,
        Err(join_err) => {
            error!(task, %join_err, "fatal: task panicked");
            Err(crate::Error::SideChainSubmission(anyhow::anyhow!(
                "{task} panicked: {join_err}"
            )))
        }
    }
}

async fn gc_loop(store: Store, interval: Duration, mut cancel: watch::Receiver<bool>) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => return Err(crate::Error::Cancelled),
            _ = tokio::time::sleep(interval) => {}
        }
        let snapshot_height = store.latest_snapshot().await?.map(|(h, _)| h).unwrap_or(0);
        let min_pin = store.min_pin_height().await?;
        let upper = snapshot_height.min(min_pin);
        let deleted = store.gc_blocks(upper).await?;
        if deleted > 0 {
            info!(deleted, upper, "garbage-collected old blocks");
        } else {
            tracing::debug!(upper, "gc sweep: nothing to collect");
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let expired = store.gc_expired_pegs(now_ms).await?;
        if expired > 0 {
            info!(expired, "garbage-collected unreachable expired pegs");
        }
    }
}
