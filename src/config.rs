// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daemon configuration, layered CLI flags over a TOML file over
//! environment variables (ambient stack; ungoverned by spec.md, built
//! in the teacher's `clap`+`toml` idiom).

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "slidechaind", about = "Slidechain custodian daemon")]
pub struct Cli {
    /// Address the HTTP surface binds to.
    #[arg(long, env = "SLIDECHAIN_ADDR")]
    pub addr: Option<SocketAddr>,

    /// Path to the sqlite database file (use `:memory:` for a
    /// throwaway store).
    #[arg(long, env = "SLIDECHAIN_DB")]
    pub db: Option<String>,

    /// Base URL of the main chain's REST/streaming endpoint (Horizon
    /// or equivalent).
    #[arg(long, env = "SLIDECHAIN_HORIZON")]
    pub horizon: Option<String>,

    /// Optional TOML config file layered beneath CLI flags and env
    /// vars.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Fully resolved daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub addr: SocketAddr,
    pub db: String,
    pub horizon: String,
    #[serde(with = "humantime_duration")]
    pub block_interval: Duration,
    #[serde(with = "humantime_duration")]
    pub gc_interval: Duration,
    pub backoff_base_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: "127.0.0.1:8000".parse().unwrap(),
            db: "slidechain.db".to_string(),
            horizon: "https://horizon-testnet.stellar.org".to_string(),
            block_interval: Duration::from_secs(5),
            gc_interval: Duration::from_secs(60),
            backoff_base_ms: 100,
        }
    }
}

impl Config {
    /// Resolves a `Config` from, in increasing precedence: built-in
    /// defaults, an optional TOML file, then explicit CLI flags
    /// (which `clap` has already merged with environment variables).
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("reading config file {path:?}: {e}"))?;
                toml::from_str(&text)
                    .map_err(|e| anyhow::anyhow!("parsing config file {path:?}: {e}"))?
            }
            None => Config::default(),
        };

        if let Some(addr) = cli.addr {
            cfg.addr = addr;
        }
        if let Some(db) = &cli.db {
            cfg.db = db.clone();
        }
        if let Some(horizon) = &cli.horizon {
            cfg.horizon = horizon.clone();
        }

        Ok(cfg)
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
