// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The peg-out pipeline (spec §4.6): the retire watcher, the peg-out
//! loop, and the settlement watcher, connected by a shared
//! [`tokio::sync::Notify`] and a bounded finalization channel.

pub mod pegout_loop;
pub mod retire_watcher;
pub mod settlement_watcher;

/// A terminal-state export row ready for step-2 finalization (spec
/// §4.6 "Each row whose state becomes OK or Fail is emitted to the
/// finalization channel"). Bounded at this size so a slow side chain
/// cannot let the finalization backlog grow without limit (ambient
/// resource-safety choice, not a spec feature).
pub const FINALIZATION_CHANNEL_CAPACITY: usize = 64;
