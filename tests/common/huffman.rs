//! Huffman tree workload used to drive the allocator.
//!
//! Every tree node lives in the arena, the min-heap that orders them does
//! not, so the arena sees exactly one allocation per leaf and one per
//! internal node.

use std::{mem, ptr, thread};

use arenalloc::{Arena, Concurrent, SyncMode, Worker};

pub const SYMBOLS: usize = 256;
pub const LARGE_PRIME: u64 = 2_147_483_647;
pub const BLOCK_SIZE: usize = 1024;

#[repr(C)]
pub struct Node {
  symbol: u8,
  freq: u64,
  left: *mut Node,
  right: *mut Node,
}

/// The arena ran out of memory while building a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted;

struct MinHeap {
  data: Vec<*mut Node>,
}

impl MinHeap {
  fn new() -> Self {
    Self {
      data: Vec::with_capacity(SYMBOLS),
    }
  }

  fn freq(
    &self,
    index: usize,
  ) -> u64 {
    unsafe { (*self.data[index]).freq }
  }

  fn push(
    &mut self,
    node: *mut Node,
  ) {
    self.data.push(node);
    let mut i = self.data.len() - 1;

    while i > 0 {
      let parent = (i - 1) / 2;
      if self.freq(parent) < self.freq(i) {
        break;
      }
      self.data.swap(parent, i);
      i = parent;
    }
  }

  fn pop(&mut self) -> Option<*mut Node> {
    if self.data.is_empty() {
      return None;
    }

    let min = self.data.swap_remove(0);
    let mut i = 0;

    loop {
      let (left, right) = (2 * i + 1, 2 * i + 2);
      let mut smallest = i;

      if left < self.data.len() && self.freq(left) < self.freq(smallest) {
        smallest = left;
      }
      if right < self.data.len() && self.freq(right) < self.freq(smallest) {
        smallest = right;
      }
      if smallest == i {
        break;
      }

      self.data.swap(i, smallest);
      i = smallest;
    }

    Some(min)
  }

  fn len(&self) -> usize {
    self.data.len()
  }
}

fn new_node<M: SyncMode>(
  worker: &mut Worker<'_, M>,
  symbol: u8,
  freq: u64,
  left: *mut Node,
  right: *mut Node,
) -> Result<*mut Node, Exhausted> {
  let node = worker.allocate(mem::size_of::<Node>()).ok_or(Exhausted)?.cast::<Node>().as_ptr();

  unsafe {
    node.write(Node {
      symbol,
      freq,
      left,
      right,
    });
  }

  Ok(node)
}

/// Releases every node of the tree, children first.
pub fn free_tree<M: SyncMode>(
  worker: &mut Worker<'_, M>,
  node: *mut Node,
) {
  if node.is_null() {
    return;
  }

  unsafe {
    free_tree(worker, (*node).left);
    free_tree(worker, (*node).right);
    worker.release(node.cast::<u8>());
  }
}

pub fn build_tree<M: SyncMode>(
  worker: &mut Worker<'_, M>,
  freq: &[u64; SYMBOLS],
) -> Result<*mut Node, Exhausted> {
  let mut heap = MinHeap::new();

  for (symbol, &count) in freq.iter().enumerate() {
    if count > 0 {
      match new_node(worker, symbol as u8, count, ptr::null_mut(), ptr::null_mut()) {
        Ok(node) => heap.push(node),
        Err(_) => return Err(abandon(worker, &mut heap)),
      }
    }
  }

  while heap.len() > 1 {
    let (Some(a), Some(b)) = (heap.pop(), heap.pop()) else {
      unreachable!("heap holds at least two nodes");
    };

    let freq = unsafe { (*a).freq + (*b).freq };
    match new_node(worker, 0, freq, a, b) {
      Ok(parent) => heap.push(parent),
      Err(_) => {
        free_tree(worker, a);
        free_tree(worker, b);
        return Err(abandon(worker, &mut heap));
      }
    }
  }

  Ok(heap.pop().unwrap_or(ptr::null_mut()))
}

/// Gives back every subtree still sitting in the heap.
fn abandon<M: SyncMode>(
  worker: &mut Worker<'_, M>,
  heap: &mut MinHeap,
) -> Exhausted {
  while let Some(node) = heap.pop() {
    free_tree(worker, node);
  }
  Exhausted
}

/// Preorder rolling hash of the tree.
pub fn hash_tree(
  node: *const Node,
  hash: u64,
) -> u64 {
  if node.is_null() {
    return hash;
  }

  unsafe {
    let hash = (hash * 31 + (*node).freq + u64::from((*node).symbol)) % LARGE_PRIME;
    let hash = hash_tree((*node).left, hash);
    hash_tree((*node).right, hash)
  }
}

pub fn frequencies(bytes: &[u8]) -> [u64; SYMBOLS] {
  let mut freq = [0u64; SYMBOLS];
  for &byte in bytes {
    freq[usize::from(byte)] += 1;
  }
  freq
}

/// Builds, hashes and tears down the tree of one block.
pub fn process_block<M: SyncMode>(
  worker: &mut Worker<'_, M>,
  bytes: &[u8],
) -> Result<u64, Exhausted> {
  let root = build_tree(worker, &frequencies(bytes))?;
  let hash = hash_tree(root, 0);
  free_tree(worker, root);
  Ok(hash)
}

/// Folds per-block hashes, in block order, into the final signature.
pub fn combine(hashes: impl IntoIterator<Item = u64>) -> u64 {
  hashes.into_iter().fold(0, |total, hash| (total + hash) % LARGE_PRIME)
}

/// Processes every block on a single worker.
pub fn signature_single<M: SyncMode>(
  arena: &Arena<M>,
  data: &[u8],
) -> Result<u64, Exhausted> {
  let mut worker = arena.worker(0).map_err(|_| Exhausted)?;
  let hashes = data
    .chunks(BLOCK_SIZE)
    .map(|block| process_block(&mut worker, block))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(combine(hashes))
}

/// Processes every block on its own thread, worker id = block index, and
/// combines the results in block order once all threads have joined.
pub fn signature_concurrent(
  arena: &Arena<Concurrent>,
  data: &[u8],
) -> Result<u64, Exhausted> {
  let hashes = thread::scope(|scope| {
    let handles: Vec<_> = data
      .chunks(BLOCK_SIZE)
      .enumerate()
      .map(|(id, block)| {
        scope.spawn(move || {
          let mut worker = arena.worker(id).map_err(|_| Exhausted)?;
          process_block(&mut worker, block)
        })
      })
      .collect();

    handles
      .into_iter()
      .map(|handle| handle.join().expect("worker thread panicked"))
      .collect::<Result<Vec<_>, _>>()
  })?;

  Ok(combine(hashes))
}

/// Deterministic pseudo-random bytes with a skewed distribution.
pub fn sample_data(len: usize) -> Vec<u8> {
  let mut state: u64 = 0x2545_F491_4F6C_DD1D;

  (0..len)
    .map(|_| {
      state ^= state << 13;
      state ^= state >> 7;
      state ^= state << 17;
      let spread = (state % 64) as u8;
      b'a' + spread % 26 + spread / 48
    })
    .collect()
}
