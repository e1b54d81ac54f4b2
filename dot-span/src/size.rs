use std::ops;

use derive_more::{
   Deref,
   DerefMut,
};

/// A byte offset/length of a source code element.
#[derive(Deref, DerefMut, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Size(u32);

impl Size {
   #[must_use]
   pub fn new(size: impl Into<Self>) -> Self {
      size.into()
   }
}

impl<I: Into<Self>> ops::Add<I> for Size {
   type Output = Self;

   fn add(self, that: I) -> Self::Output {
      Self(*self + *that.into())
   }
}

impl<I: Into<Self>> ops::Sub<I> for Size {
   type Output = Self;

   #[track_caller]
   fn sub(self, that: I) -> Self::Output {
      Self(*self - *that.into())
   }
}

impl From<Size> for u32 {
   fn from(this: Size) -> Self {
      *this
   }
}

impl From<u32> for Size {
   fn from(that: u32) -> Self {
      Self(that)
   }
}

impl From<Size> for usize {
   fn from(this: Size) -> Self {
      *this as usize
   }
}

impl From<usize> for Size {
   fn from(that: usize) -> Self {
      Self(u32::try_from(that).expect("usize must fit in u32"))
   }
}

/// A trait to extract a [`Size`] out of things that have a byte length.
pub trait IntoSize {
   fn size(&self) -> Size;
}

impl IntoSize for char {
   fn size(&self) -> Size {
      self.len_utf8().into()
   }
}

impl IntoSize for str {
   fn size(&self) -> Size {
      self.len().into()
   }
}

impl IntoSize for String {
   fn size(&self) -> Size {
      self.len().into()
   }
}
