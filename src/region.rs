use std::{io, mem, ptr::NonNull};

use crate::error::{ArenaError, Result};

/// Size of the machine words headers and free-list nodes are made of.
pub(crate) const WORD: usize = mem::size_of::<usize>();

/// The backing memory of an arena, addressed by byte offsets.
///
/// ```text
///   base                                                       base + len
///   ┌──────────────────────────────────────────────────────────────┐
///   │  offset 0 ...                                      len - 1    │
///   └──────────────────────────────────────────────────────────────┘
/// ```
///
/// Everything the allocator stores inside the region (headers, free-list
/// links) goes through [`Region::read_word`] and [`Region::write_word`], which
/// check bounds and alignment. Callers of the arena get raw pointers into the
/// same memory and may write to it concurrently, so we never hand out Rust
/// references to the bytes.
pub(crate) struct Region {
  base: NonNull<u8>,
  len: usize,
}

// The region is plain memory. Who may touch which bytes is decided by the
// free-list lock and by slab ownership, not by the region itself.
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Region {
  /// Reserves `len` bytes from the kernel in one go.
  pub fn reserve(len: usize) -> Result<Self> {
    match unsafe { mmap(len) } {
      Some(base) => Ok(Self { base, len }),
      None => Err(ArenaError::Reserve {
        bytes: len,
        source: io::Error::last_os_error(),
      }),
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// Returns the offset of `address` if it points inside the region.
  pub fn offset_of(
    &self,
    address: *const u8,
  ) -> Option<usize> {
    let offset = address.addr().checked_sub(self.base.as_ptr().addr())?;
    (offset < self.len).then_some(offset)
  }

  /// Pointer to the byte at `offset`.
  pub fn pointer_at(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    assert!(offset <= self.len, "offset {offset} past the end of the region");
    unsafe { self.base.add(offset) }
  }

  pub fn read_word(
    &self,
    offset: usize,
  ) -> usize {
    self.check_word(offset);
    unsafe { self.base.as_ptr().add(offset).cast::<usize>().read() }
  }

  pub fn write_word(
    &self,
    offset: usize,
    value: usize,
  ) {
    self.check_word(offset);
    unsafe { self.base.as_ptr().add(offset).cast::<usize>().write(value) }
  }

  fn check_word(
    &self,
    offset: usize,
  ) {
    assert!(
      offset % WORD == 0 && offset.checked_add(WORD).is_some_and(|end| end <= self.len),
      "word access at offset {offset} outside of a region of {} bytes",
      self.len
    );
  }
}

impl Drop for Region {
  fn drop(&mut self) {
    unsafe { munmap(self.base, self.len) }
  }
}

/// Anonymous, private, read-write mapping of `length` bytes.
#[cfg(not(miri))]
unsafe fn mmap(length: usize) -> Option<NonNull<u8>> {
  let protection = libc::PROT_READ | libc::PROT_WRITE;
  let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;

  let address = unsafe { libc::mmap(std::ptr::null_mut(), length, protection, flags, -1, 0) };

  if address == libc::MAP_FAILED {
    return None;
  }

  NonNull::new(address.cast::<u8>())
}

#[cfg(not(miri))]
unsafe fn munmap(
  base: NonNull<u8>,
  length: usize,
) {
  if unsafe { libc::munmap(base.as_ptr().cast::<libc::c_void>(), length) } != 0 {
    tracing::warn!(
      length,
      error = %io::Error::last_os_error(),
      "failed to unmap arena region"
    );
  }
}

#[cfg(miri)]
unsafe fn mmap(length: usize) -> Option<NonNull<u8>> {
  let layout = std::alloc::Layout::from_size_align(length, crate::align::ALIGNMENT).ok()?;
  NonNull::new(unsafe { std::alloc::alloc(layout) })
}

#[cfg(miri)]
unsafe fn munmap(
  base: NonNull<u8>,
  length: usize,
) {
  if let Ok(layout) = std::alloc::Layout::from_size_align(length, crate::align::ALIGNMENT) {
    unsafe { std::alloc::dealloc(base.as_ptr(), layout) }
  }
}
