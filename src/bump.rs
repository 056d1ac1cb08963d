use std::{
  ptr::NonNull,
  sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use tracing::debug;

use crate::{Arena, align::checked_align, sync::SyncMode};

/// Per-slab state kept by the arena so that a slab survives the worker
/// handle that used it.
#[derive(Debug, Default)]
pub(crate) struct Slab {
  /// Bytes handed out from this slab so far.
  used: AtomicUsize,
  /// Set while a [`Worker`] holds the slab.
  claimed: AtomicBool,
}

impl Slab {
  pub fn claim(&self) -> bool {
    self
      .claimed
      .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
      .is_ok()
  }

  pub fn used(&self) -> usize {
    self.used.load(Ordering::Relaxed)
  }

  fn unclaim(
    &self,
    used: usize,
  ) {
    self.used.store(used, Ordering::Relaxed);
    self.claimed.store(false, Ordering::Release);
  }
}

/// Bump allocator over one worker's slab, in arena offsets.
///
/// ```text
///   base               cursor                            end
///   ┌───┬──────┬───────┬───────────────────────────────────┐
///   │A1 │  A2  │  A3   │            Free Space             │
///   └───┴──────┴───────┴───────────────────────────────────┘
/// ```
///
/// Bytes are never given back. The first request that does not fit moves
/// the cursor to `end`, so every later request misses as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BumpPool {
  base: usize,
  cursor: usize,
  end: usize,
}

impl BumpPool {
  pub fn new(
    base: usize,
    used: usize,
    size: usize,
  ) -> Self {
    Self {
      base,
      cursor: base + used,
      end: base + size,
    }
  }

  /// `size` must already be aligned.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<usize> {
    let end = self.cursor.checked_add(size)?;

    if end > self.end {
      return None;
    }

    let offset = self.cursor;
    self.cursor = end;

    Some(offset)
  }

  pub fn retire(&mut self) {
    self.cursor = self.end;
  }

  pub fn is_retired(&self) -> bool {
    self.cursor == self.end
  }

  pub fn used(&self) -> usize {
    self.cursor - self.base
  }

  pub fn remaining(&self) -> usize {
    self.end - self.cursor
  }
}

/// A worker's handle on the arena. Allocations try the worker's own slab
/// first and fall back to the shared free list once the slab runs out.
///
/// Obtained with [`Arena::worker`]. Only one handle per id can be alive at a
/// time. Dropping it keeps the slab's cursor, so claiming the same id again
/// continues where the previous handle stopped.
pub struct Worker<'a, M: SyncMode = crate::sync::DefaultMode> {
  arena: &'a Arena<M>,
  id: usize,
  pool: Option<BumpPool>,
}

impl<'a, M: SyncMode> Worker<'a, M> {
  pub(crate) fn new(
    arena: &'a Arena<M>,
    id: usize,
  ) -> Self {
    Self { arena, id, pool: None }
  }

  pub fn id(&self) -> usize {
    self.id
  }

  pub fn arena(&self) -> &'a Arena<M> {
    self.arena
  }

  /// Allocates `size` bytes aligned to [`crate::align::ALIGNMENT`]. Returns
  /// `None` for `size == 0` or when both the slab and the shared free list
  /// are out of space.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    if size == 0 {
      return None;
    }

    match self.fast_allocate(size) {
      Some(pointer) => Some(pointer),
      None => self.arena.allocate(size),
    }
  }

  /// Slab-only allocation. No header is written and no lock is taken.
  fn fast_allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let size = checked_align(size).unwrap_or(usize::MAX);
    let (arena, id) = (self.arena, self.id);
    let pool = self.pool.get_or_insert_with(|| arena.bind_slab(id));

    match pool.allocate(size) {
      Some(offset) => {
        arena.counters().fast_alloc();
        Some(arena.pointer_at(offset))
      }
      None => {
        if !pool.is_retired() {
          debug!(worker = id, used = pool.used(), size, "bump pool exhausted, using shared free list");
          pool.retire();
        }
        None
      }
    }
  }

  /// Releases a pointer obtained from this arena. Slab pointers are ignored,
  /// everything else goes to the shared free list. See [`Arena::release`].
  ///
  /// # Safety
  ///
  /// Same contract as [`Arena::release`].
  pub unsafe fn release(
    &mut self,
    pointer: *mut u8,
  ) {
    unsafe { self.arena.release(pointer) }
  }

  /// Bytes still available in this worker's slab.
  pub fn slab_remaining(&self) -> usize {
    match self.pool {
      Some(pool) => pool.remaining(),
      None => self.arena.bind_slab(self.id).remaining(),
    }
  }
}

impl<M: SyncMode> Drop for Worker<'_, M> {
  fn drop(&mut self) {
    let used = match self.pool {
      Some(pool) => pool.used(),
      None => self.arena.bind_slab(self.id).used(),
    };

    self.arena.slab(self.id).unclaim(used);
  }
}
