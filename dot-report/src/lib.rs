//! Diagnostics.
//!
//! Everything the scanner and parser report funnels through [`Diagnostic`]:
//! a flat `{position, message}` pair, never a severity-graded, multi-label
//! report. The richer label/point/severity model this crate's teacher
//! carries is deliberately not reproduced here; see `DESIGN.md`.

mod diagnostic;
pub use diagnostic::{
   Diagnostic,
   Diagnostics,
};

mod error;
pub use error::{
   Context,
   Contextful,
   Error,
   Result,
};
