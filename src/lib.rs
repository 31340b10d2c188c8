// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slidechain: a trusted-custodian bridge between a main settlement
//! chain and a programmable side chain.

pub mod config;
pub mod contract;
pub mod db;
pub mod error;
pub mod http;
pub mod mainchain;
pub mod nonce;
pub mod pegin;
pub mod pegout;
pub mod pin;
pub mod submitter;
pub mod supervisor;
pub mod telemetry;
pub mod types;

pub use error::{Error, Result};
