//! Computes a Huffman tree signature over generated data twice: once on a
//! single worker with the unlocked arena, once with one thread per block on
//! the locked arena. Both runs must agree.
//!
//! ```text
//! RUST_LOG=arenalloc=debug cargo run --example signature
//! ```

#[path = "../tests/common/huffman.rs"]
mod huffman;

use arenalloc::{Arena, ArenaConfig, ArenaStats, Concurrent, Single};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 200 KiB of input, 200 blocks.
const DATA_LEN: usize = 200 * huffman::BLOCK_SIZE;

fn report(
  label: &str,
  signature: u64,
  stats: ArenaStats,
) {
  println!("[{label}] Final signature: {signature}");
  println!(
    "[{label}] shared allocs = {}, shared frees = {}, slab allocs = {}, slab frees = {}, bypassed = {:.2}%",
    stats.shared_allocs,
    stats.shared_frees,
    stats.fast_allocs,
    stats.fast_frees,
    stats.bypass_ratio() * 100.0
  );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let data = huffman::sample_data(DATA_LEN);
  let config = ArenaConfig::default();

  // --------------------------------------------------------------------
  // 1) One worker, no lock. Slabs are not used at all.
  // --------------------------------------------------------------------
  let single = Arena::<Single>::new(&config.with_worker_count(1).with_slab_size(0))?;
  let expected = huffman::signature_single(&single, &data).map_err(|_| "single-worker run exhausted the arena")?;
  report("single", expected, single.stats());

  // --------------------------------------------------------------------
  // 2) One thread per block. Each thread bumps through its own slab and
  //    falls back to the locked free list once the slab is full.
  // --------------------------------------------------------------------
  let concurrent = Arena::<Concurrent>::new(&config)?;
  let actual = huffman::signature_concurrent(&concurrent, &data).map_err(|_| "concurrent run exhausted the arena")?;
  report("concurrent", actual, concurrent.stats());

  info!(
    free_blocks = concurrent.free_blocks().len(),
    matches = expected == actual,
    "done"
  );

  if expected != actual {
    return Err("signatures differ between single and concurrent runs".into());
  }

  Ok(())
}
