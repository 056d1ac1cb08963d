use serde::{Deserialize, Serialize};

use crate::{
  align::ALIGNMENT,
  block::HEADER_SIZE,
  error::{ArenaError, Result},
};

/// Default arena size: 2 MiB.
pub const DEFAULT_TOTAL_BYTES: usize = 2 * 1024 * 1024;

/// Default number of worker slabs.
pub const DEFAULT_WORKER_COUNT: usize = 1024;

/// Default slab size per worker.
pub const DEFAULT_SLAB_SIZE: usize = 1024;

/// Dimensions of an arena.
///
/// ```toml
/// total_bytes = 2097152
/// worker_count = 1024
/// slab_size = 1024
/// ```
///
/// Missing keys take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
  /// Size of the whole backing region.
  pub total_bytes: usize,
  /// Maximum number of workers with their own slab.
  pub worker_count: usize,
  /// Bytes reserved for each worker. Must be a multiple of [`ALIGNMENT`],
  /// zero disables the fast path.
  pub slab_size: usize,
}

impl Default for ArenaConfig {
  fn default() -> Self {
    Self {
      total_bytes: DEFAULT_TOTAL_BYTES,
      worker_count: DEFAULT_WORKER_COUNT,
      slab_size: DEFAULT_SLAB_SIZE,
    }
  }
}

impl ArenaConfig {
  pub fn new(
    total_bytes: usize,
    worker_count: usize,
    slab_size: usize,
  ) -> Self {
    Self {
      total_bytes,
      worker_count,
      slab_size,
    }
  }

  pub fn from_toml_str(source: &str) -> Result<Self> {
    Ok(toml::from_str(source)?)
  }

  pub fn with_total_bytes(
    mut self,
    total_bytes: usize,
  ) -> Self {
    self.total_bytes = total_bytes;
    self
  }

  pub fn with_worker_count(
    mut self,
    worker_count: usize,
  ) -> Self {
    self.worker_count = worker_count;
    self
  }

  pub fn with_slab_size(
    mut self,
    slab_size: usize,
  ) -> Self {
    self.slab_size = slab_size;
    self
  }

  /// Bytes taken by the worker slabs at the front of the arena.
  pub fn pool_bytes(&self) -> Result<usize> {
    self
      .worker_count
      .checked_mul(self.slab_size)
      .ok_or(ArenaError::PoolOverflow {
        worker_count: self.worker_count,
        slab_size: self.slab_size,
      })
  }

  /// Checks that the slabs stay aligned and leave room for the shared free
  /// list.
  pub fn validate(&self) -> Result<()> {
    if self.slab_size % ALIGNMENT != 0 {
      return Err(ArenaError::MisalignedSlab {
        slab_size: self.slab_size,
        alignment: ALIGNMENT,
      });
    }

    let pool_bytes = self.pool_bytes()?;

    if pool_bytes.checked_add(HEADER_SIZE).is_none_or(|needed| self.total_bytes <= needed) {
      return Err(ArenaError::ArenaTooSmall {
        total_bytes: self.total_bytes,
        pool_bytes,
      });
    }

    Ok(())
  }
}
