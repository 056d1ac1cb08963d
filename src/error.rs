//! Error types for arena setup and misuse.
//!
//! Exhaustion is not an error here: running out of memory is reported as
//! `None` from the allocation calls and left to the caller.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArenaError {
  /// The kernel refused to map the backing region.
  #[error("failed to reserve {bytes} bytes for the arena: {source}")]
  Reserve {
    bytes: usize,
    #[source]
    source: io::Error,
  },

  /// Nothing (or not even a single header) is left for the shared free
  /// list once the worker slabs are carved out.
  #[error(
    "arena of {total_bytes} bytes has no shared space left after reserving {pool_bytes} bytes for worker slabs"
  )]
  ArenaTooSmall { total_bytes: usize, pool_bytes: usize },

  /// `worker_count * slab_size` does not fit in a `usize`.
  #[error("worker slab reservation of {worker_count} x {slab_size} bytes overflows")]
  PoolOverflow { worker_count: usize, slab_size: usize },

  /// Slabs must keep every bump pointer aligned.
  #[error("slab size {slab_size} is not a multiple of {alignment}")]
  MisalignedSlab { slab_size: usize, alignment: usize },

  /// The configuration could not be parsed.
  #[error("invalid arena configuration: {0}")]
  Config(#[from] toml::de::Error),

  #[error("worker id {id} is out of range, the arena has {worker_count} slabs")]
  UnknownWorker { id: usize, worker_count: usize },

  #[error("worker id {id} is already bound to a live worker")]
  WorkerBusy { id: usize },

  /// Release of a pointer that does not lead to a live allocation. The
  /// public release path never returns this: it aborts the process.
  #[error("invalid free of {address:#x}: {reason}")]
  InvalidFree { address: usize, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, ArenaError>;
