use std::sync::atomic::{AtomicUsize, Ordering};

/// Running totals of where allocations and releases were served.
#[derive(Debug, Default)]
pub(crate) struct Counters {
  fast_allocs: AtomicUsize,
  fast_frees: AtomicUsize,
  shared_allocs: AtomicUsize,
  shared_frees: AtomicUsize,
  exhausted: AtomicUsize,
}

impl Counters {
  pub fn fast_alloc(&self) {
    self.fast_allocs.fetch_add(1, Ordering::Relaxed);
  }

  pub fn fast_free(&self) {
    self.fast_frees.fetch_add(1, Ordering::Relaxed);
  }

  pub fn shared_alloc(&self) {
    self.shared_allocs.fetch_add(1, Ordering::Relaxed);
  }

  pub fn shared_free(&self) {
    self.shared_frees.fetch_add(1, Ordering::Relaxed);
  }

  pub fn exhausted(&self) {
    self.exhausted.fetch_add(1, Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> ArenaStats {
    ArenaStats {
      fast_allocs: self.fast_allocs.load(Ordering::Relaxed),
      fast_frees: self.fast_frees.load(Ordering::Relaxed),
      shared_allocs: self.shared_allocs.load(Ordering::Relaxed),
      shared_frees: self.shared_frees.load(Ordering::Relaxed),
      exhausted: self.exhausted.load(Ordering::Relaxed),
    }
  }
}

/// Point-in-time copy of the arena counters, see [`crate::Arena::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
  /// Allocations served from a worker slab.
  pub fast_allocs: usize,
  /// Releases of slab pointers, which are no-ops.
  pub fast_frees: usize,
  /// Allocations served by the shared free list.
  pub shared_allocs: usize,
  /// Releases handed to the shared free list.
  pub shared_frees: usize,
  /// Shared allocations that found no block large enough.
  pub exhausted: usize,
}

impl ArenaStats {
  /// Number of trips through the free-list guard. In concurrent mode each
  /// one is a lock acquisition.
  pub fn lock_acquisitions(&self) -> usize {
    self.shared_allocs + self.exhausted + self.shared_frees
  }

  /// Share of calls that never touched the free list.
  pub fn bypass_ratio(&self) -> f64 {
    let bypassed = self.fast_allocs + self.fast_frees;
    let total = bypassed + self.lock_acquisitions();

    if total == 0 {
      return 0.0;
    }

    bypassed as f64 / total as f64
  }
}
