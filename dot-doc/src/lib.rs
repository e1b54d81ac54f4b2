//! Tag-document pretty-printing.
//!
//! A three-pass engine — measure, layout, render — over a flat stream of
//! [`Tag`]s, driving every formatting decision off a single fixed column
//! budget ([`tag::MAX_COLUMN`]). The printer in `dot-syntax` is the only
//! intended producer of [`Doc`]; everything here is agnostic to DOT.

mod width;
pub use width::width;

mod wrap;
pub use wrap::wrap;

mod tag;
pub use tag::{
   MAX_COLUMN,
   Tag,
   TagCondition,
};

mod doc;
pub use doc::{
   Doc,
   Format,
};
