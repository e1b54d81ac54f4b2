use std::fmt;

use dot_span::Position;

/// A single diagnostic: a position and a message.
///
/// No severity, no labels, no secondary spans — every diagnostic (lexical,
/// syntactic, semantic) surfaces through this one `{position, message}`
/// shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
   pub position: Position,
   pub message: String,
}

impl Diagnostic {
   #[must_use]
   pub fn new(position: Position, message: impl Into<String>) -> Self {
      Self {
         position,
         message: message.into(),
      }
   }
}

impl fmt::Display for Diagnostic {
   fn fmt(&self, writer: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(
         writer,
         "{line}:{column}: {message}",
         line = self.position.line,
         column = self.position.column,
         message = self.message,
      )
   }
}

/// An ordered list of diagnostics.
///
/// Diagnostics are always appended in source-position order, since both
/// scanner and parser only ever append as they advance through the input;
/// this type does not sort, it only accumulates and renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
   #[must_use]
   pub fn new() -> Self {
      Self::default()
   }

   pub fn push(&mut self, diagnostic: Diagnostic) {
      self.0.push(diagnostic);
   }

   #[must_use]
   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   #[must_use]
   pub fn len(&self) -> usize {
      self.0.len()
   }

   pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
      self.0.iter()
   }

   #[must_use]
   pub fn into_vec(self) -> Vec<Diagnostic> {
      self.0
   }

   /// Returns whether positions are non-decreasing, i.e. whether the
   /// append-order invariant actually holds. Used by tests, not by
   /// production code (the invariant is maintained by construction).
   #[must_use]
   pub fn is_ordered(&self) -> bool {
      self.0.windows(2).all(|pair| pair[0].position <= pair[1].position)
   }
}

impl<'a> IntoIterator for &'a Diagnostics {
   type Item = &'a Diagnostic;
   type IntoIter = std::slice::Iter<'a, Diagnostic>;

   fn into_iter(self) -> Self::IntoIter {
      self.0.iter()
   }
}

impl FromIterator<Diagnostic> for Diagnostics {
   fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
      Self(iter.into_iter().collect())
   }
}

impl fmt::Display for Diagnostics {
   fn fmt(&self, writer: &mut fmt::Formatter<'_>) -> fmt::Result {
      for diagnostic in &self.0 {
         writeln!(writer, "{diagnostic}")?;
      }
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn display_format() {
      let diagnostic = Diagnostic::new(Position::new(1, 11), "unexpected token '@'");
      assert_eq!(diagnostic.to_string(), "1:11: unexpected token '@'");
   }

   #[test]
   fn ordering_check() {
      let mut diagnostics = Diagnostics::new();
      diagnostics.push(Diagnostic::new(Position::new(1, 1), "a"));
      diagnostics.push(Diagnostic::new(Position::new(1, 5), "b"));
      diagnostics.push(Diagnostic::new(Position::new(2, 1), "c"));
      assert!(diagnostics.is_ordered());
   }
}
