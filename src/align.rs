/// Every size the arena records or compares is a multiple of this.
pub const ALIGNMENT: usize = 16;

/// Rounds the given size up to the arena alignment ([`ALIGNMENT`]).
///
/// # Examples
///
/// ```rust
/// use arenalloc::align;
///
/// assert_eq!(align!(1), 16);
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(100), 112);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Rounds the given size down to the arena alignment.
pub(crate) const fn align_down(value: usize) -> usize {
  value & !(ALIGNMENT - 1)
}

/// Same as [`align!`] but refuses to wrap around for sizes close to
/// `usize::MAX`.
pub(crate) fn checked_align(value: usize) -> Option<usize> {
  value
    .checked_add(ALIGNMENT - 1)
    .map(|value| value & !(ALIGNMENT - 1))
}
