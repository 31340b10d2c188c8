// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The operator CLI (spec §6): `peg`, `export`, and `account
//! new|issue|trust` subcommands, implemented as thin HTTP-calling
//! wrappers around `slidechaind`'s routes. Main-chain/side-chain
//! transaction construction and signing are the out-of-scope
//! collaborator named in spec §1; this CLI only drives the daemon's
//! already-built routes.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slidechain-cli", about = "Slidechain operator CLI")]
struct Cli {
    /// Base URL of a running `slidechaind` instance.
    #[arg(long, env = "SLIDECHAIN_DAEMON", default_value = "http://127.0.0.1:8000")]
    daemon: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a peg-in: POSTs to `/record-peg-in`, assuming the
    /// caller already submitted the pre-peg transaction out of band.
    Peg {
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        asset_xdr: String,
        #[arg(long)]
        recip_pubkey: String,
        #[arg(long)]
        exp_ms: i64,
    },
    /// Submit a raw export transaction to `/submit`.
    Export {
        #[arg(long)]
        tx_path: std::path::PathBuf,
        #[arg(long, default_value_t = false)]
        wait: bool,
    },
    #[command(subcommand)]
    Account(AccountCommand),
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Fetches the custodian's main-chain account id from `/account`.
    New,
    /// Signing a main-chain issuance trigger is out of scope for this
    /// CLI (spec §1); this just reports the account id operators need
    /// to fund externally.
    Issue,
    /// Establishing a main-chain trustline is likewise an external
    /// main-chain signing concern; this reports the account id only.
    Trust,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    slidechain::telemetry::init();
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let result = match cli.command {
        Command::Peg { amount, asset_xdr, recip_pubkey, exp_ms } => {
            #[derive(serde::Serialize)]
            struct Body {
                amount: u64,
                asset_xdr: String,
                recip_pubkey: String,
                exp_ms: i64,
            }
            let resp = client
                .post(format!("{}/record-peg-in", cli.daemon))
                .json(&Body { amount, asset_xdr, recip_pubkey, exp_ms })
                .send()
                .await?;
            report(resp).await
        }
        Command::Export { tx_path, wait } => {
            let bytes = std::fs::read(tx_path)?;
            let resp = client
                .post(format!("{}/submit?wait={}", cli.daemon, wait as u8))
                .body(bytes)
                .send()
                .await?;
            report(resp).await
        }
        Command::Account(AccountCommand::New | AccountCommand::Issue | AccountCommand::Trust) => {
            let resp = client.get(format!("{}/account", cli.daemon)).send().await?;
            report(resp).await
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn report(resp: reqwest::Response) -> anyhow::Result<()> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if status.is_success() {
        println!("{body}");
        Ok(())
    } else {
        anyhow::bail!("daemon returned {status}: {body}")
    }
}
