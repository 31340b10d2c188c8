// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The GC bound the supervisor's garbage collector actually computes
//! (spec §4.1, §4.7): blocks are only eligible for deletion below
//! both the latest snapshot height and the slowest pin's height, and
//! genesis plus the latest block are always retained.

use slidechain::db::Store;

async fn seed_blocks(store: &Store, up_to: u64) {
    for h in 1..=up_to {
        store
            .finalize_height(h, format!("hash{h}").as_bytes(), b"bits", format!("snap{h}").as_bytes())
            .await
            .unwrap();
    }
}

fn gc_upper(snapshot_height: u64, min_pin: u64) -> u64 {
    snapshot_height.min(min_pin)
}

#[tokio::test]
async fn gc_bound_respects_the_slower_of_snapshot_and_pin() {
    let store = Store::open_in_memory().await.unwrap();
    seed_blocks(&store, 10).await;

    store.ensure_pin("exports").await.unwrap();
    store.ensure_pin("pegouts").await.unwrap();
    store.advance_pin("exports", 8).await.unwrap();
    store.advance_pin("pegouts", 4).await.unwrap();

    let snapshot_height = store.latest_snapshot().await.unwrap().unwrap().0;
    assert_eq!(snapshot_height, 10);
    let min_pin = store.min_pin_height().await.unwrap();
    assert_eq!(min_pin, 4, "the slower pin must gate collection, not the faster one");

    let upper = gc_upper(snapshot_height, min_pin);
    assert_eq!(upper, 4);

    let deleted = store.gc_blocks(upper).await.unwrap();
    assert_eq!(deleted, 2); // heights 2, 3

    assert!(store.get_block(1).await.unwrap().is_some(), "genesis is always retained");
    assert!(store.get_block(4).await.unwrap().is_some(), "the pin's own height is retained");
    assert!(store.get_block(10).await.unwrap().is_some(), "the latest block is always retained");
    assert!(store.get_block(2).await.unwrap().is_none());
    assert!(store.get_block(3).await.unwrap().is_none());
}

#[tokio::test]
async fn gc_is_a_no_op_before_any_pin_has_advanced() {
    let store = Store::open_in_memory().await.unwrap();
    seed_blocks(&store, 5).await;
    store.ensure_pin("exports").await.unwrap();

    let snapshot_height = store.latest_snapshot().await.unwrap().unwrap().0;
    let min_pin = store.min_pin_height().await.unwrap();
    assert_eq!(min_pin, 0, "a freshly ensured pin starts at height 0");

    let upper = gc_upper(snapshot_height, min_pin);
    let deleted = store.gc_blocks(upper).await.unwrap();
    assert_eq!(deleted, 0, "nothing may be collected while a pin hasn't moved off height 0");
    for h in 1..=5u64 {
        assert!(store.get_block(h).await.unwrap().is_some());
    }
}
