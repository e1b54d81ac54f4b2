use std::{
   fmt,
   result,
   sync::Arc,
};

/// A type alias for concise use of [`Error`].
pub type Result<T> = result::Result<T, Error>;

/// The boundary error type, for genuine I/O failures on a writer. These
/// propagate unchanged rather than folding into the diagnostic list.
///
/// This is never used for parse failures — those are [`crate::Diagnostic`]s,
/// not errors. Wraps `anyhow::Error` behind an `Arc` so `Error` stays
/// cheaply `Clone`. `Display`/`Debug` are hand-written below, so deriving
/// `thiserror::Error` with no `#[error(...)]` attribute only contributes the
/// blanket `std::error::Error` impl.
#[derive(thiserror::Error, Clone)]
pub struct Error(Arc<anyhow::Error>);

impl Error {
   #[must_use]
   pub fn new(error: impl Into<anyhow::Error>) -> Self {
      Self(Arc::new(error.into()))
   }
}

impl fmt::Debug for Error {
   fn fmt(&self, writer: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(writer, "{error:?}", error = self.0)
   }
}

impl fmt::Display for Error {
   fn fmt(&self, writer: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(writer, "{error}", error = self.0)
   }
}

impl From<std::io::Error> for Error {
   fn from(error: std::io::Error) -> Self {
      Self::new(error)
   }
}

impl From<fmt::Error> for Error {
   fn from(error: fmt::Error) -> Self {
      Self::new(anyhow::Error::new(error))
   }
}

/// The type of context accepted by [`Contextful`].
pub trait Context: fmt::Display + Send + Sync + 'static {}
impl<T: fmt::Display + Send + Sync + 'static> Context for T {}

/// Adds context to a fallible result, chaining through to the wrapped
/// `anyhow::Error`.
pub trait Contextful<T> {
   fn context(self, context: impl Context) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Contextful<T> for result::Result<T, E> {
   fn context(self, context: impl Context) -> Result<T> {
      anyhow::Context::context(self, context.to_string()).map_err(Error::new)
   }
}
