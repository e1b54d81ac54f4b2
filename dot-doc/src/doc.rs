use std::fmt;

use crate::tag::{
   Tag,
   TagCondition,
   Tags,
};

/// Which format [`Doc::render`] should produce.
///
/// Only [`Format::Default`] is on the normative rendering path; the other
/// two exist purely to inspect how a document measured and laid out, for
/// debugging a printer rule that isn't producing the output you expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
   /// The final, rendered DOT source text.
   #[default]
   Default,
   /// A debug dump of the tag stream after the layout pass has decided
   /// which groups break.
   Layout,
   /// A debug dump resembling `go/format`'s `Node.String()` tree view.
   GoLike,
}

/// A builder for a tag document: the intermediate representation the
/// printer emits and the layout engine measures, lays out, and renders.
#[derive(Debug, Clone, Default)]
pub struct Doc<'a>(Tags<'a>);

impl<'a> Doc<'a> {
   #[must_use]
   pub fn new() -> Self {
      Self(Tags::new())
   }

   #[must_use]
   pub fn text(mut self, text: impl Into<std::borrow::Cow<'a, str>>) -> Self {
      self.0.write(Tag::Text(text.into()));
      self
   }

   #[must_use]
   pub fn text_if(mut self, condition: TagCondition, text: impl Into<std::borrow::Cow<'a, str>>) -> Self {
      self.0.write_if(condition, Tag::Text(text.into()));
      self
   }

   #[must_use]
   pub fn space(mut self) -> Self {
      self.0.write(Tag::Space);
      self
   }

   #[must_use]
   pub fn space_if(mut self, condition: TagCondition) -> Self {
      self.0.write_if(condition, Tag::Space);
      self
   }

   /// Inserts a break: `n == 0` moves to the next line, `n >= 1` additionally
   /// leaves `n` blank lines above it. Emits nothing when its enclosing
   /// group prints flat.
   #[must_use]
   pub fn break_(mut self, n: usize) -> Self {
      self.0.write(Tag::Break(n));
      self
   }

   #[must_use]
   pub fn break_if(mut self, condition: TagCondition, n: usize) -> Self {
      self.0.write_if(condition, Tag::Break(n));
      self
   }

   /// Groups `build`'s output so it is printed either entirely flat or
   /// entirely broken, whichever fits within `max` (and the overall column
   /// budget).
   #[must_use]
   pub fn group(mut self, max: usize, build: impl FnOnce(Self) -> Self) -> Self {
      self.0.write_with(Tag::Group(max), |tags| {
         let inner = build(Self(std::mem::take(tags)));
         *tags = inner.0;
      });
      self
   }

   /// Adjusts the ambient indent by `delta` columns for `build`'s output.
   #[must_use]
   pub fn indent(self, delta: isize, build: impl FnOnce(Self) -> Self) -> Self {
      self.indent_if(TagCondition::Always, delta, build)
   }

   #[must_use]
   pub fn indent_if(mut self, condition: TagCondition, delta: isize, build: impl FnOnce(Self) -> Self) -> Self {
      self.0.write_if_with(condition, Tag::Indent(delta), |tags| {
         let inner = build(Self(std::mem::take(tags)));
         *tags = inner.0;
      });
      self
   }

   /// Renders the document as `format`.
   ///
   /// # Errors
   /// Propagates whatever `writer` fails with.
   pub fn render(&self, writer: &mut dyn fmt::Write, format: Format) -> fmt::Result {
      match format {
         Format::Default => self.0.render(writer),
         Format::Layout => self.0.render_layout_debug(writer),
         Format::GoLike => self.0.render_golike_debug(writer),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn render(doc: &Doc<'_>) -> String {
      let mut out = String::new();
      doc.render(&mut out, Format::Default).unwrap();
      out
   }

   #[test]
   fn builds_flat_text() {
      let doc = Doc::new().text("digraph").space().text("{}");
      assert_eq!(render(&doc), "digraph {}");
   }

   #[test]
   fn group_with_forced_break() {
      let doc = Doc::new().group(crate::tag::MAX_COLUMN, |doc| doc.text("a").break_(0).text("b"));
      assert_eq!(render(&doc), "a\nb");
   }

   #[test]
   fn indent_applies_inside_broken_group() {
      let doc = Doc::new().group(0, |doc| doc.indent(2, |doc| doc.text("a").break_(0).text("b")));
      assert_eq!(render(&doc), "a\n  b");
   }
}
