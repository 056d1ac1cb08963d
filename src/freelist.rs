use tracing::trace;

use crate::{
  align::checked_align,
  block::{Block, FreeBlock, HEADER_SIZE, Header},
  error::{ArenaError, Result},
  region::Region,
};

/// Address-ordered, singly linked list of free blocks threaded through the
/// shared part of the region.
///
/// ```text
///   start                                                           end
///   ┌──────┬───────┬──────┬──────────────┬──────┬─────────────────────┐
///   │ Free │ Alloc │ Free │    Alloc     │ Free │       Alloc         │
///   └──┬───┴───────┴──▲─┬─┴──────────────┴──▲───┴─────────────────────┘
///      │              │ │                   │
///      └──────────────┘ └───────────────────┘
///   ▲
///   head
/// ```
///
/// Links are offsets into the region. After every call returns, the list is
/// sorted by offset and no two blocks touch each other.
pub struct FreeList {
  head: Option<usize>,
  start: usize,
  end: usize,
}

impl FreeList {
  /// Seeds `[start, end)` as a single free block. `end - start` must be at
  /// least [`HEADER_SIZE`].
  pub(crate) fn new(
    region: &Region,
    start: usize,
    end: usize,
  ) -> Self {
    Block::new(end - start - HEADER_SIZE, None).write(region, start);

    Self {
      head: Some(start),
      start,
      end,
    }
  }

  /// First-fit allocation. Returns the offset of the user bytes, right after
  /// the header, or `None` if no block is large enough.
  pub(crate) fn allocate(
    &mut self,
    region: &Region,
    size: usize,
  ) -> Option<usize> {
    if size == 0 {
      return None;
    }

    let size = checked_align(size)?;

    let mut previous = None;
    let mut current = self.head;

    while let Some(offset) = current {
      let block = Block::read(region, offset);

      if block.size >= size {
        let remaining = block.size - size;

        // Splitting only pays off if the rest can hold its own bookkeeping
        // plus at least one aligned unit. Otherwise the slack goes with the
        // allocation and comes back on release.
        let (recorded, replacement) = if remaining > HEADER_SIZE {
          let split = offset + HEADER_SIZE + size;
          Block::new(remaining - HEADER_SIZE, block.next).write(region, split);
          (size, Some(split))
        } else {
          (block.size, block.next)
        };

        self.relink(region, previous, replacement);
        Header::new(recorded).write(region, offset);

        trace!(offset, size = recorded, "carved shared block");

        return Some(offset + HEADER_SIZE);
      }

      previous = Some(offset);
      current = block.next;
    }

    None
  }

  /// Takes back the allocation whose user bytes start at `offset`, then
  /// coalesces the whole list.
  ///
  /// Nothing is modified when validation fails.
  pub(crate) fn release(
    &mut self,
    region: &Region,
    offset: usize,
  ) -> Result<()> {
    let header_offset = self.validate(region, offset)?;
    let header = Header::read(region, header_offset);
    let block_end = header_offset + HEADER_SIZE + header.size;

    match self.head {
      Some(head) if head < header_offset => {
        let mut current = head;
        let mut block = Block::read(region, current);

        while let Some(next) = block.next.filter(|&next| next < header_offset) {
          current = next;
          block = Block::read(region, current);
        }

        if block.end(current) > header_offset || block.next.is_some_and(|next| next < block_end) {
          return Err(invalid_free(region, offset, "allocation overlaps a free block"));
        }

        Block::new(header.size, block.next).write(region, header_offset);
        Block::new(block.size, Some(header_offset)).write(region, current);
      }
      head => {
        if head.is_some_and(|head| head < block_end) {
          return Err(invalid_free(region, offset, "allocation overlaps a free block"));
        }

        Block::new(header.size, head).write(region, header_offset);
        self.head = Some(header_offset);
      }
    }

    trace!(offset = header_offset, size = header.size, "released shared block");

    self.coalesce(region);

    Ok(())
  }

  /// Merges every pair of neighbouring free blocks in a single pass.
  fn coalesce(
    &mut self,
    region: &Region,
  ) {
    let mut current = self.head;

    while let Some(offset) = current {
      let block = Block::read(region, offset);

      match block.next {
        Some(next) if block.end(offset) == next => {
          let absorbed = Block::read(region, next);
          Block::new(block.size + HEADER_SIZE + absorbed.size, absorbed.next).write(region, offset);
        }
        next => current = next,
      }
    }
  }

  /// Checks that `offset` can be the user pointer of a live allocation and
  /// returns the offset of its header.
  fn validate(
    &self,
    region: &Region,
    offset: usize,
  ) -> Result<usize> {
    if offset % HEADER_SIZE != 0 {
      return Err(invalid_free(region, offset, "pointer is not aligned"));
    }

    let header_offset = match offset.checked_sub(HEADER_SIZE) {
      Some(header_offset) if header_offset >= self.start && offset <= self.end => header_offset,
      _ => return Err(invalid_free(region, offset, "pointer is outside the shared region")),
    };

    let header = Header::read(region, header_offset);

    if !header.is_valid() {
      return Err(invalid_free(region, offset, "header tag mismatch"));
    }

    if header.size % HEADER_SIZE != 0 || header.size > self.end - offset {
      return Err(invalid_free(region, offset, "header size runs past the shared region"));
    }

    Ok(header_offset)
  }

  fn relink(
    &mut self,
    region: &Region,
    previous: Option<usize>,
    next: Option<usize>,
  ) {
    match previous {
      Some(offset) => {
        let block = Block::read(region, offset);
        Block::new(block.size, next).write(region, offset);
      }
      None => self.head = next,
    }
  }

  /// Free blocks in list order.
  pub(crate) fn blocks(
    &self,
    region: &Region,
  ) -> Vec<FreeBlock> {
    let mut blocks = Vec::new();
    let mut current = self.head;

    while let Some(offset) = current {
      let block = Block::read(region, offset);
      blocks.push(FreeBlock {
        offset,
        size: block.size,
      });
      current = block.next;
    }

    blocks
  }
}

fn invalid_free(
  region: &Region,
  offset: usize,
  reason: &'static str,
) -> ArenaError {
  ArenaError::InvalidFree {
    address: region.pointer_at(offset.min(region.len())).as_ptr().addr(),
    reason,
  }
}
