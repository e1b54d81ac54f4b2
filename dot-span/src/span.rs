use std::ops;

use crate::Size;

/// A byte range within a source buffer, half-open (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
   pub start: Size,
   pub end: Size,
}

impl Span {
   #[must_use]
   pub fn new(start: impl Into<Size>, end: impl Into<Size>) -> Self {
      Self {
         start: start.into(),
         end: end.into(),
      }
   }

   #[must_use]
   pub fn len(self) -> Size {
      self.end - self.start
   }

   #[must_use]
   pub fn is_empty(self) -> bool {
      self.start == self.end
   }

   /// A `std::ops::Range<usize>` for indexing into a `&str`.
   #[must_use]
   pub fn std(self) -> ops::Range<usize> {
      usize::from(self.start)..usize::from(self.end)
   }
}

impl From<Span> for ops::Range<usize> {
   fn from(span: Span) -> Self {
      span.std()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn slices_correctly() {
      let source = "hello, world";
      let span = Span::new(7_usize, 12_usize);
      assert_eq!(&source[span.std()], "world");
   }
}
