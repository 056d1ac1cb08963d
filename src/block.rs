use crate::{
  align,
  region::{Region, WORD},
};

/// Bytes in front of every shared allocation. Free blocks use the same two
/// words for their own bookkeeping, so this is also the free-block overhead.
pub const HEADER_SIZE: usize = align!(2 * WORD);

/// Tag written into the header of every live shared allocation.
pub const MAGIC: usize = 0xDEAD_BEEF;

/// Stored in the link word of the last free block.
const END_OF_LIST: usize = usize::MAX;

/// Header of a live allocation.
///
/// ```text
///   ┌──────────────┬──────────────┬──────────────────────────┐
///   │ size         │ tag (MAGIC)  │ user data (size bytes)   │
///   └──────────────┴──────────────┴──────────────────────────┘
///   ▲                             ▲
///   header offset                 returned pointer
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
  pub size: usize,
  pub tag: usize,
}

impl Header {
  pub fn new(size: usize) -> Self {
    Self { size, tag: MAGIC }
  }

  pub fn read(
    region: &Region,
    offset: usize,
  ) -> Self {
    Self {
      size: region.read_word(offset),
      tag: region.read_word(offset + WORD),
    }
  }

  pub fn write(
    &self,
    region: &Region,
    offset: usize,
  ) {
    region.write_word(offset, self.size);
    region.write_word(offset + WORD, self.tag);
  }

  pub fn is_valid(&self) -> bool {
    self.tag == MAGIC
  }
}

/// A free block as stored in the region. The link occupies the slot of the
/// header tag, which is what makes a released header fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block {
  pub size: usize,
  pub next: Option<usize>,
}

impl Block {
  pub fn new(
    size: usize,
    next: Option<usize>,
  ) -> Self {
    Self { size, next }
  }

  pub fn read(
    region: &Region,
    offset: usize,
  ) -> Self {
    let next = match region.read_word(offset + WORD) {
      END_OF_LIST => None,
      next => Some(next),
    };

    Self {
      size: region.read_word(offset),
      next,
    }
  }

  pub fn write(
    &self,
    region: &Region,
    offset: usize,
  ) {
    region.write_word(offset, self.size);
    region.write_word(offset + WORD, self.next.unwrap_or(END_OF_LIST));
  }

  /// First byte past this block when it starts at `offset`.
  pub fn end(
    &self,
    offset: usize,
  ) -> usize {
    offset + HEADER_SIZE + self.size
  }
}

/// A free block as seen from the outside, see [`crate::Arena::free_blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Offset of the block's bookkeeping words from the arena base.
  pub offset: usize,
  /// Usable bytes, not counting the bookkeeping words.
  pub size: usize,
}

impl FreeBlock {
  pub fn end(&self) -> usize {
    self.offset + HEADER_SIZE + self.size
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_size_is_aligned() {
    assert_eq!(HEADER_SIZE % crate::align::ALIGNMENT, 0);
    assert!(HEADER_SIZE >= 2 * WORD);
  }

  #[test]
  fn test_released_header_fails_validation() {
    let region = Region::reserve(4096).unwrap();

    Header::new(64).write(&region, 32);
    assert!(Header::read(&region, 32).is_valid());

    Block::new(64, None).write(&region, 32);
    assert!(!Header::read(&region, 32).is_valid());

    Block::new(64, Some(128)).write(&region, 32);
    assert!(!Header::read(&region, 32).is_valid());
    assert_eq!(Block::read(&region, 32), Block::new(64, Some(128)));
  }

  #[test]
  fn test_block_end() {
    let block = Block::new(112, None);
    assert_eq!(block.end(0), HEADER_SIZE + 112);

    let free = FreeBlock { offset: 16, size: 32 };
    assert_eq!(free.end(), 16 + HEADER_SIZE + 32);
  }
}
