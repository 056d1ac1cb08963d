//! # arenalloc - A Two-Tier Region Allocator
//!
//! This crate hands out memory from a single region reserved up front. The
//! region is split between small per-worker slabs, served by a bump pointer
//! with no synchronization, and a shared free list that every worker falls
//! back to once its slab runs out.
//!
//! ## Overview
//!
//! ```text
//!   Arena Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         ARENA (T bytes)                              │
//!   │                                                                      │
//!   │   ┌────────┬────────┬─────┬────────┬─────────────────────────────┐   │
//!   │   │ slab 0 │ slab 1 │ ... │slab W-1│     shared free region      │   │
//!   │   └────────┴────────┴─────┴────────┴─────────────────────────────┘   │
//!   │   ◄──────────── W x P ────────────►◄────────── T - W x P ────────►   │
//!   │      bump pointers, no lock             first-fit free list,        │
//!   │      never reclaimed                    coalesced on release        │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   arenalloc
//!   ├── align      - Alignment macro (align!) and helpers
//!   ├── arena      - Arena: initialization, shared allocate/release
//!   ├── block      - Allocation header and free block layout
//!   ├── bump       - Per-worker bump pools and the Worker handle
//!   ├── config     - ArenaConfig, loadable from TOML
//!   ├── error      - ArenaError
//!   ├── freelist   - First-fit free list with coalescing (internal)
//!   ├── region     - mmap'd backing memory addressed by offset (internal)
//!   ├── stats      - Allocation counters
//!   └── sync       - Single / Concurrent modes
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use arenalloc::{Arena, Concurrent};
//!
//! let arena = Arena::<Concurrent>::initialize(64 * 1024, 4, 1024).unwrap();
//!
//! std::thread::scope(|scope| {
//!   for id in 0..4 {
//!     let arena = &arena;
//!     scope.spawn(move || {
//!       let mut worker = arena.worker(id).unwrap();
//!       let pointer = worker.allocate(64).unwrap();
//!
//!       unsafe {
//!         pointer.as_ptr().write_bytes(0xAB, 64);
//!         worker.release(pointer.as_ptr());
//!       }
//!     });
//!   }
//! });
//!
//! assert_eq!(arena.free_blocks().len(), 1);
//! ```
//!
//! ## Shared Allocations
//!
//! Every block taken from the shared free list carries a header:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Allocation Header  │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ tag: 0xDEADBEEF │  │  │     N bytes usable       │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │      16 bytes         │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! Releasing a pointer whose header does not carry the tag aborts the
//! process. Releasing a pointer from a worker slab does nothing.
//!
//! ## Modes
//!
//! [`Arena<Concurrent>`](Concurrent) guards the free list with a mutex and can
//! be shared between threads. [`Arena<Single>`](Single) has no lock at all and
//! cannot leave the thread that owns it. The `single-worker` Cargo feature
//! makes `Single` the default mode of [`Arena`].
//!
//! ## Limitations
//!
//! - **Fixed size**: exhaustion is reported as `None`, the arena never grows
//! - **Slabs leak**: bytes handed out from a slab are never reused
//! - **Unix-only**: the region comes from `mmap(2)` through `libc`
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.

pub mod align;
mod arena;
mod block;
mod bump;
mod config;
mod error;
mod freelist;
mod region;
mod stats;
mod sync;

pub use arena::Arena;
pub use block::{FreeBlock, HEADER_SIZE, MAGIC};
pub use bump::Worker;
pub use config::{ArenaConfig, DEFAULT_SLAB_SIZE, DEFAULT_TOTAL_BYTES, DEFAULT_WORKER_COUNT};
pub use error::{ArenaError, Result};
pub use stats::ArenaStats;
pub use sync::{Concurrent, DefaultMode, Single, SyncMode};
