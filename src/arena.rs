use std::{process, ptr::NonNull};

use tracing::{debug, error, info};

use crate::{
  align::align_down,
  block::FreeBlock,
  bump::{BumpPool, Slab, Worker},
  config::ArenaConfig,
  error::{ArenaError, Result},
  freelist::FreeList,
  region::Region,
  stats::{ArenaStats, Counters},
  sync::{DefaultMode, SyncMode, sealed::Guard},
};

/// A fixed-size region split into per-worker slabs and a shared free list.
///
/// ```text
///   0                      W * P                                   T
///   ┌──────┬──────┬───┬──────┬───────────────────────────────────┐
///   │ slab │ slab │...│ slab │        shared free region         │
///   │  0   │  1   │   │ W-1  │   (first-fit list, coalescing)    │
///   └──────┴──────┴───┴──────┴───────────────────────────────────┘
/// ```
///
/// The region is reserved once and never grows. Dropping the arena unmaps
/// it, so every pointer it handed out dies with it.
pub struct Arena<M: SyncMode = DefaultMode> {
  region: Region,
  config: ArenaConfig,
  pool_end: usize,
  free_list: M::Guard,
  slabs: Box<[Slab]>,
  counters: Counters,
}

impl<M: SyncMode> Arena<M> {
  /// Reserves `total_bytes`, of which `worker_count * slab_size` go to the
  /// worker slabs and the rest seeds the shared free list.
  pub fn initialize(
    total_bytes: usize,
    worker_count: usize,
    slab_size: usize,
  ) -> Result<Self> {
    Self::new(&ArenaConfig::new(total_bytes, worker_count, slab_size))
  }

  pub fn new(config: &ArenaConfig) -> Result<Self> {
    config.validate()?;

    let pool_end = config.pool_bytes()?;
    let region = Region::reserve(config.total_bytes)?;
    let shared_end = align_down(config.total_bytes);
    let free_list = FreeList::new(&region, pool_end, shared_end);

    let slabs = (0..config.worker_count).map(|_| Slab::default()).collect();

    info!(
      total_bytes = config.total_bytes,
      worker_count = config.worker_count,
      slab_size = config.slab_size,
      shared_bytes = shared_end - pool_end,
      mode = M::NAME,
      "arena initialized"
    );

    Ok(Self {
      region,
      config: *config,
      pool_end,
      free_list: <M::Guard as Guard>::new(free_list),
      slabs,
      counters: Counters::default(),
    })
  }

  /// Allocates from the shared free list, skipping any worker slab.
  ///
  /// Returns `None` for `size == 0` and when no free block is large enough.
  pub fn allocate(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    if size == 0 {
      return None;
    }

    match self.free_list.with(|list| list.allocate(&self.region, size)) {
      Some(offset) => {
        self.counters.shared_alloc();
        Some(self.region.pointer_at(offset))
      }
      None => {
        self.counters.exhausted();
        debug!(size, "shared free list exhausted");
        None
      }
    }
  }

  /// Gives memory back to the arena.
  ///
  /// Null is a no-op, and so is any pointer inside the worker slabs. Anything
  /// else must come from [`Arena::allocate`] or [`Worker::allocate`] and not
  /// have been released yet. A pointer that fails validation aborts the
  /// process: at that point the free list can no longer be trusted.
  ///
  /// # Safety
  ///
  /// The memory behind `pointer` must not be used after this call.
  pub unsafe fn release(
    &self,
    pointer: *mut u8,
  ) {
    if let Err(error) = self.try_release(pointer) {
      abort_on_invalid_free(error);
    }
  }

  pub(crate) fn try_release(
    &self,
    pointer: *mut u8,
  ) -> Result<()> {
    if pointer.is_null() {
      return Ok(());
    }

    let Some(offset) = self.region.offset_of(pointer) else {
      return Err(ArenaError::InvalidFree {
        address: pointer.addr(),
        reason: "pointer is outside the arena",
      });
    };

    if offset < self.pool_end {
      self.counters.fast_free();
      return Ok(());
    }

    self.free_list.with(|list| list.release(&self.region, offset))?;
    self.counters.shared_free();

    Ok(())
  }

  /// Claims the slab of worker `id`.
  pub fn worker(
    &self,
    id: usize,
  ) -> Result<Worker<'_, M>> {
    let slab = self.slabs.get(id).ok_or(ArenaError::UnknownWorker {
      id,
      worker_count: self.config.worker_count,
    })?;

    if !slab.claim() {
      return Err(ArenaError::WorkerBusy { id });
    }

    Ok(Worker::new(self, id))
  }

  /// Snapshot of the shared free list in address order.
  pub fn free_blocks(&self) -> Vec<FreeBlock> {
    self.free_list.with(|list| list.blocks(&self.region))
  }

  pub fn stats(&self) -> ArenaStats {
    self.counters.snapshot()
  }

  pub fn config(&self) -> &ArenaConfig {
    &self.config
  }

  /// Whether `pointer` points anywhere inside the arena.
  pub fn contains(
    &self,
    pointer: *const u8,
  ) -> bool {
    self.region.offset_of(pointer).is_some()
  }

  /// Offset of `pointer` from the arena base, if it points inside it.
  pub fn offset_of(
    &self,
    pointer: *const u8,
  ) -> Option<usize> {
    self.region.offset_of(pointer)
  }

  /// Byte range `[start, end)` of the shared free region.
  pub fn shared_range(&self) -> (usize, usize) {
    (self.pool_end, align_down(self.config.total_bytes))
  }

  pub(crate) fn bind_slab(
    &self,
    id: usize,
  ) -> BumpPool {
    let size = self.config.slab_size;
    BumpPool::new(id * size, self.slab(id).used(), size)
  }

  pub(crate) fn slab(
    &self,
    id: usize,
  ) -> &Slab {
    &self.slabs[id]
  }

  pub(crate) fn pointer_at(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    self.region.pointer_at(offset)
  }

  pub(crate) fn counters(&self) -> &Counters {
    &self.counters
  }
}

#[cold]
fn abort_on_invalid_free(error: ArenaError) -> ! {
  error!(%error, "invalid free detected, aborting");
  eprintln!("Error: {error}");
  process::abort()
}
