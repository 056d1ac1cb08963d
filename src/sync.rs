//! Compile-time choice between a locked and an unlocked shared free list.
//!
//! ```text
//!   Arena<Single>      free list in a RefCell, no lock, arena is !Sync
//!   Arena<Concurrent>  free list behind one parking_lot::Mutex
//! ```

use std::cell::RefCell;

use parking_lot::Mutex;

use crate::freelist::FreeList;

/// How the shared free list is protected. Implemented by [`Single`] and
/// [`Concurrent`] only.
pub trait SyncMode: sealed::Sealed + 'static {
  #[doc(hidden)]
  type Guard: sealed::Guard;

  /// Shows up in logs.
  const NAME: &'static str;
}

/// One worker at a time. The free list is never locked, and the compiler
/// rejects sharing the arena across threads.
#[derive(Debug)]
pub enum Single {}

/// Any number of threads. Every free-list call takes the arena mutex.
#[derive(Debug)]
pub enum Concurrent {}

impl SyncMode for Single {
  type Guard = RefCell<FreeList>;

  const NAME: &'static str = "single";
}

impl SyncMode for Concurrent {
  type Guard = Mutex<FreeList>;

  const NAME: &'static str = "concurrent";
}

/// The mode `Arena` uses when none is named, picked by the `single-worker`
/// Cargo feature.
#[cfg(feature = "single-worker")]
pub type DefaultMode = Single;

/// The mode `Arena` uses when none is named, picked by the `single-worker`
/// Cargo feature.
#[cfg(not(feature = "single-worker"))]
pub type DefaultMode = Concurrent;

pub(crate) mod sealed {
  use super::*;

  pub trait Sealed {}

  impl Sealed for Single {}
  impl Sealed for Concurrent {}

  pub trait Guard {
    fn new(list: FreeList) -> Self;

    fn with<R>(
      &self,
      f: impl FnOnce(&mut FreeList) -> R,
    ) -> R;
  }

  impl Guard for RefCell<FreeList> {
    fn new(list: FreeList) -> Self {
      RefCell::new(list)
    }

    fn with<R>(
      &self,
      f: impl FnOnce(&mut FreeList) -> R,
    ) -> R {
      f(&mut self.borrow_mut())
    }
  }

  impl Guard for Mutex<FreeList> {
    fn new(list: FreeList) -> Self {
      Mutex::new(list)
    }

    fn with<R>(
      &self,
      f: impl FnOnce(&mut FreeList) -> R,
    ) -> R {
      f(&mut self.lock())
    }
  }
}
