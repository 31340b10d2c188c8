// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The broadcast fan-out primitive (spec §4.2, §9 "Broadcast fan-out"):
//! a one-writer-many-reader queue where every write is visible to
//! every subscriber created at or before the write, each subscriber
//! consumes in order, and a subscriber created after a write never
//! sees it. Built on `tokio::sync::broadcast`, the same mechanism the
//! teacher uses for its own head-change publisher
//! (`message_pool::msgpool::test_provider::TestApi`), rather than a
//! hand-rolled ring buffer.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::submitter::Block;

/// Bounded to avoid an unbounded backlog building up for a subscriber
/// that never reads; a slow subscriber instead observes
/// `RecvError::Lagged` and must re-synchronize via `GetBlock`.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<Arc<Block>>,
}

pub type Subscriber = broadcast::Receiver<Arc<Block>>;

impl Broadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Broadcaster { sender }
    }

    /// Committed blocks become visible to every subscriber created at
    /// or before this call, in commit order (spec §8 property 5).
    pub fn publish(&self, block: Arc<Block>) {
        // No receivers is not an error: a block committed before any
        // pin has subscribed yet is simply replayed from the store's
        // backlog instead (spec §4.3 startup sequence).
        let _ = self.sender.send(block);
    }

    /// A subscriber bound to all blocks committed hereafter; it never
    /// observes a write that happened before this call (spec §4.2
    /// "Submit(tx) -> subscriber").
    pub fn subscribe(&self) -> Subscriber {
        self.sender.subscribe()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
