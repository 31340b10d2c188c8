// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crate-wide error type, following the taxonomy in the error handling
//! design: transient errors are retried and never escalated, database
//! and side-chain submission errors are fatal, malformed input maps to
//! a 4xx at the HTTP boundary, and cancellation is a clean exit rather
//! than an error.

use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Transient network or stream error. The caller is expected to
    /// retry with jittered exponential backoff; never escalated.
    #[error("transient error: {0}")]
    Transient(#[source] anyhow::Error),

    /// Schema or database error. Fatal: the process logs and exits.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Main-chain reported a recoverable bad-sequence error on a
    /// peg-out submission.
    #[error("bad sequence number")]
    BadSequence,

    /// Side-chain submission failed for an import or finalization
    /// transaction. Fatal: issued value may be lost or unsettled.
    #[error("side-chain submission failed: {0}")]
    SideChainSubmission(#[source] anyhow::Error),

    /// Malformed HTTP input. Maps to 4xx with a short diagnostic body.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The caller's context was cancelled. Never reported as an error
    /// up the stack; treated as a clean exit.
    #[error("cancelled")]
    Cancelled,

    /// A pin runner observed a block whose height skips ahead of its
    /// persisted cursor. Fatal: indicates lost blocks.
    #[error("pin {name} gap: expected height {expected}, got {got}")]
    PinGap {
        name: String,
        expected: u64,
        got: u64,
    },

    /// A contract template's seed was requested before its
    /// dependencies were resolved. Always a template-authoring bug,
    /// never a runtime condition reachable from external input.
    #[error("template resolution error: {0}")]
    TemplateResolution(String),

    /// The row referenced by a caller does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn transient(err: impl Into<anyhow::Error>) -> Self {
        Error::Transient(err.into())
    }

    pub fn side_chain_submission(err: impl Into<anyhow::Error>) -> Self {
        Error::SideChainSubmission(err.into())
    }

    pub fn malformed(msg: impl fmt::Display) -> Self {
        Error::MalformedInput(msg.to_string())
    }

    /// True for errors spec §7 classifies as fatal (process should
    /// log and exit rather than retry).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Database(_)
                | Error::SideChainSubmission(_)
                | Error::PinGap { .. }
                | Error::TemplateResolution(_)
        )
    }
}
