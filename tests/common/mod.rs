//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod huffman;

use arenalloc::{Arena, FreeBlock, HEADER_SIZE, SyncMode};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// The single free block a pristine arena starts with.
pub fn pristine<M: SyncMode>(arena: &Arena<M>) -> Vec<FreeBlock> {
  let (start, end) = arena.shared_range();
  vec![FreeBlock {
    offset: start,
    size: end - start - HEADER_SIZE,
  }]
}

/// Free blocks are sorted, inside the shared range and never touch.
pub fn assert_coalesced<M: SyncMode>(arena: &Arena<M>) {
  let (start, end) = arena.shared_range();
  let blocks = arena.free_blocks();

  for block in &blocks {
    assert!(block.offset >= start && block.end() <= end, "{block:?} outside {start}..{end}");
  }

  for pair in blocks.windows(2) {
    assert!(pair[0].end() < pair[1].offset, "{:?} not coalesced with {:?}", pair[0], pair[1]);
  }
}
