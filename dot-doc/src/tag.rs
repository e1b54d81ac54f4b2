use std::{
   borrow::Cow,
   cell::Cell,
   fmt,
   slice,
};

use crate::width;

/// The maximum column a rendered line may reach before a [`Tag::Group`]
/// with a matching budget is forced to break. Fixed, not configurable.
pub const MAX_COLUMN: usize = 100;

/// A single element of the tag-document IR.
///
/// `Tags` stores these flat, in document order, with each node-shaped tag
/// (`Group`/`Indent`) owning the contiguous run of tags that follows it as
/// its children — see [`TagData::len`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag<'a> {
   /// Literal text, never containing a line break.
   Text(Cow<'a, str>),
   /// A single space, collapsible with adjacent spaces and elidable at a
   /// forced break.
   Space,
   /// `n` blank lines when broken (`n == 0` is "break to the next line",
   /// `n >= 1` inserts `n` empty lines before it), nothing when flat.
   Break(usize),
   /// A group that is either printed entirely flat or, if it would not fit
   /// within the column budget, entirely broken.
   Group(usize),
   /// Adjusts the ambient indent by `delta` columns for its children.
   Indent(isize),
}

impl Tag<'_> {
   #[must_use]
   pub fn is_node(&self) -> bool {
      matches!(*self, Self::Group(..) | Self::Indent(..))
   }
}

impl<'a, I: Into<Cow<'a, str>>> From<I> for Tag<'a> {
   fn from(value: I) -> Self {
      Self::Text(value.into())
   }
}

/// Whether a tag's emission depends on whether its enclosing group is
/// printed flat or broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCondition {
   /// Always present, flat or broken.
   Always,
   /// Only when the enclosing group prints flat.
   Flat,
   /// Only when the enclosing group prints broken.
   Broken,
}

#[derive(Debug, Clone, Copy, Default)]
struct Measure {
   width: usize,
   column: usize,
}

#[derive(Debug, Clone)]
struct TagData<'a> {
   tag: Tag<'a>,
   /// The number of tags immediately following this one that are its
   /// children. Always `0` for non-node tags.
   len: usize,
   condition: TagCondition,
   measure: Cell<Measure>,
}

impl TagData<'_> {
   /// Computes this tag's own contribution to its enclosing group's width,
   /// folding in the already-measured widths of `children`. A width of
   /// `usize::MAX` means "contains a forced break; never fits flat".
   fn measure(&self, children: TagsIter<'_>) {
      if self.condition == TagCondition::Broken {
         self.measure.set(Measure { width: 0, column: 0 });
         return;
      }

      let width = match &self.tag {
         Tag::Text(text) if text.contains('\n') => usize::MAX,
         Tag::Text(text) => width(text),
         Tag::Space => 1,
         Tag::Break(_) => usize::MAX,
         Tag::Group(_) | Tag::Indent(_) => children.fold(0_usize, |acc, (data, grandchildren)| {
            data.measure(grandchildren);
            acc.saturating_add(data.measure.get().width)
         }),
      };

      self.measure.set(Measure { width, column: 0 });
   }
}

/// A flattened stream of [`Tag`]s produced by [`Tags`]'s builder methods.
///
/// A flat `Vec` rather than a recursive tree, so that measuring and
/// rendering are simple linear passes instead of recursive-descent tree
/// walks.
#[derive(Debug, Clone, Default)]
pub struct Tags<'a>(Vec<TagData<'a>>);

/// An iterator that splits a slice of sibling tags into `(tag, children)`
/// pairs, skipping over each node's children automatically.
#[derive(Clone)]
pub struct TagsIter<'a>(slice::Iter<'a, TagData<'a>>);

impl<'a> Iterator for TagsIter<'a> {
   type Item = (&'a TagData<'a>, TagsIter<'a>);

   fn next(&mut self) -> Option<Self::Item> {
      let data = self.0.next()?;
      let rest = self.0.as_slice();

      let children_len = data.len.min(rest.len());
      let (children, after) = rest.split_at(children_len);

      self.0 = after.iter();

      Some((data, TagsIter(children.iter())))
   }
}

impl<'a> Tags<'a> {
   #[must_use]
   pub fn new() -> Self {
      Self(Vec::new())
   }

   fn iter(&self) -> TagsIter<'_> {
      TagsIter(self.0.iter())
   }

   fn tag_should_pop(&self, tag: &Tag<'a>) -> bool {
      matches!(tag, Tag::Space) && matches!(self.0.last().map(|data| &data.tag), Some(Tag::Space))
   }

   /// Appends a leaf tag (never a node: `Group`/`Indent` must go through
   /// [`Self::write_with`]).
   pub fn write(&mut self, tag: impl Into<Tag<'a>>) -> &mut Self {
      self.write_if(TagCondition::Always, tag)
   }

   pub fn write_if(&mut self, condition: TagCondition, tag: impl Into<Tag<'a>>) -> &mut Self {
      let tag = tag.into();
      assert!(!tag.is_node(), "use write_with for node tags: {tag:?}");

      if self.tag_should_pop(&tag) {
         return self;
      }

      self.0.push(TagData {
         tag,
         len: 0,
         condition,
         measure: Cell::new(Measure::default()),
      });

      self
   }

   /// Appends a node tag (`Group`/`Indent`), running `build` to populate its
   /// children, which are whatever tags `build` pushes onto `self`.
   pub fn write_with(&mut self, tag: impl Into<Tag<'a>>, build: impl FnOnce(&mut Self)) -> &mut Self {
      self.write_if_with(TagCondition::Always, tag, build)
   }

   pub fn write_if_with(
      &mut self,
      condition: TagCondition,
      tag: impl Into<Tag<'a>>,
      build: impl FnOnce(&mut Self),
   ) -> &mut Self {
      let tag = tag.into();
      let tag_is_node = tag.is_node();

      let index = self.0.len();
      self.0.push(TagData {
         tag,
         len: 0,
         condition,
         measure: Cell::new(Measure::default()),
      });

      let starting_len = self.0.len();
      build(self);
      let len = self.0.len() - starting_len;

      assert!(tag_is_node || len == 0, "inserted children for non-node tag at {index}");

      self.0[index].len = len;

      self
   }

   /// Runs the measure and layout passes, fixing which groups break, using
   /// `column_max` as the column budget for groups with no tighter budget
   /// of their own.
   fn layout(&self, column_max: usize) {
      let mut iter = self.iter();
      while let Some((data, children)) = iter.next() {
         data.measure(children);
      }

      struct Layer {
         indent: usize,
         column: usize,
         column_max: usize,
      }

      impl Layer {
         fn layout(&mut self, mut iter: TagsIter<'_>) {
            while let Some((data, children)) = iter.next() {
               match &data.tag {
                  Tag::Text(text) if text.contains('\n') => {
                     let after_last_newline = text.rsplit('\n').next().unwrap_or_default();
                     self.column = self.indent + width(after_last_newline);
                  },

                  Tag::Text(text) => {
                     self.column += width(text);
                  },

                  Tag::Space => {
                     self.column += 1;
                  },

                  Tag::Break(0) => {},

                  Tag::Break(_) => {
                     self.column = self.indent;
                  },

                  Tag::Group(max) => {
                     let measured = data.measure.get().width;

                     let fits =
                        measured != usize::MAX && self.column + measured <= self.column_max && measured <= *max;

                     if fits {
                        self.column += measured;
                     } else {
                        data.measure.set(Measure {
                           width: usize::MAX,
                           column: self.column,
                        });
                        self.layout(children);
                     }
                  },

                  Tag::Indent(delta) => {
                     let broken = data.condition != TagCondition::Flat;

                     let previous_indent = self.indent;
                     if broken {
                        self.indent = delta
                           .is_negative()
                           .then(|| self.indent.checked_sub(delta.unsigned_abs()).unwrap_or(0))
                           .unwrap_or_else(|| self.indent.saturating_add_signed(*delta));
                     }

                     self.layout(children);

                     self.indent = previous_indent;
                  },
               }
            }
         }
      }

      Layer {
         indent: 0,
         column: 0,
         column_max,
      }
      .layout(self.iter());
   }

   /// Whether the tag at a given layout position prints broken.
   fn is_broken(data: &TagData<'_>) -> bool {
      match &data.tag {
         Tag::Group(_) => data.measure.get().width == usize::MAX,
         _ => true,
      }
   }

   /// Renders this document into `writer`, running the layout pass first
   /// against [`MAX_COLUMN`].
   ///
   /// # Errors
   /// Propagates whatever `writer` itself fails with.
   pub fn render(&self, writer: &mut dyn fmt::Write) -> fmt::Result {
      self.layout(MAX_COLUMN);

      let mut renderer = Renderer {
         writer,
         indent: 0,
         pending_space: false,
         pending_breaks: 0,
      };

      renderer.render(self.iter(), true)
   }

   /// Dumps the tag stream after layout, one tag per line, annotated with
   /// whether it printed flat or broken. Debug-only; never used by
   /// [`crate::Format::Default`].
   pub(crate) fn render_layout_debug(&self, writer: &mut dyn fmt::Write) -> fmt::Result {
      self.layout(MAX_COLUMN);

      fn go(writer: &mut dyn fmt::Write, iter: TagsIter<'_>, depth: usize) -> fmt::Result {
         for (data, children) in iter {
            for _ in 0..depth {
               writer.write_str("  ")?;
            }

            match &data.tag {
               Tag::Group(max) => writeln!(
                  writer,
                  "Group(max={max}) [{}]",
                  if Tags::is_broken(data) { "broken" } else { "flat" }
               )?,
               Tag::Indent(delta) => writeln!(writer, "Indent({delta})")?,
               other => writeln!(writer, "{other:?}")?,
            }

            go(writer, children, depth + 1)?;
         }

         Ok(())
      }

      go(writer, self.iter(), 0)
   }

   /// Dumps the tag stream as a nested, Go-`format`-like tree view. Debug
   /// only.
   pub(crate) fn render_golike_debug(&self, writer: &mut dyn fmt::Write) -> fmt::Result {
      fn go(writer: &mut dyn fmt::Write, iter: TagsIter<'_>, depth: usize) -> fmt::Result {
         for (data, children) in iter {
            for _ in 0..depth {
               writer.write_str(".  ")?;
            }
            writeln!(writer, "{:?}", data.tag)?;
            go(writer, children, depth + 1)?;
         }

         Ok(())
      }

      go(writer, self.iter(), 0)
   }
}

struct Renderer<'w> {
   writer: &'w mut dyn fmt::Write,
   indent: usize,
   pending_space: bool,
   pending_breaks: usize,
}

impl Renderer<'_> {
   fn flush_pending(&mut self) -> fmt::Result {
      for _ in 0..self.pending_breaks {
         self.writer.write_char('\n')?;
      }

      if self.pending_breaks > 0 {
         for _ in 0..self.indent {
            self.writer.write_char(' ')?;
         }
      } else if self.pending_space {
         self.writer.write_char(' ')?;
      }

      self.pending_breaks = 0;
      self.pending_space = false;

      Ok(())
   }

   fn render(&mut self, mut iter: TagsIter<'_>, flat_context: bool) -> fmt::Result {
      while let Some((data, children)) = iter.next() {
         let broken = flat_context && Tags::is_broken(data);

         match (&data.tag, data.condition) {
            (_, TagCondition::Flat) if broken => continue,
            (_, TagCondition::Broken) if !broken => continue,
            _ => {},
         }

         match &data.tag {
            Tag::Text(text) => {
               self.flush_pending()?;
               self.writer.write_str(text)?;
            },

            Tag::Space => {
               self.pending_space = true;
            },

            Tag::Break(0) => {
               self.pending_breaks = self.pending_breaks.max(1);
            },

            Tag::Break(n) => {
               self.pending_breaks = self.pending_breaks.max(n + 1);
            },

            Tag::Group(_) => {
               self.render(children, broken)?;
            },

            Tag::Indent(delta) => {
               let previous_indent = self.indent;
               if broken {
                  self.indent = delta
                     .is_negative()
                     .then(|| self.indent.checked_sub(delta.unsigned_abs()).unwrap_or(0))
                     .unwrap_or_else(|| self.indent.saturating_add_signed(*delta));
               }

               self.render(children, broken)?;

               self.indent = previous_indent;
            },
         }
      }

      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn render(tags: &Tags<'_>) -> String {
      let mut out = String::new();
      tags.render(&mut out).unwrap();
      out
   }

   #[test]
   fn flat_group_fits() {
      let mut tags = Tags::new();
      tags.write_with(Tag::Group(MAX_COLUMN), |tags| {
         tags.write("a").write(Tag::Space).write("b");
      });
      assert_eq!(render(&tags), "a b");
   }

   #[test]
   fn forced_break_breaks_enclosing_group() {
      let mut tags = Tags::new();
      tags.write_with(Tag::Group(MAX_COLUMN), |tags| {
         tags.write("a").write(Tag::Break(0)).write("b");
      });
      assert_eq!(render(&tags), "a\nb");
   }

   #[test]
   fn indent_applies_only_when_broken() {
      let mut tags = Tags::new();
      tags.write_with(Tag::Group(0), |tags| {
         tags.write_with(Tag::Indent(2), |tags| {
            tags.write("a").write(Tag::Break(0)).write("b");
         });
      });
      assert_eq!(render(&tags), "a\n  b");
   }

   #[test]
   fn consecutive_spaces_collapse() {
      let mut tags = Tags::new();
      tags.write(Tag::Space).write(Tag::Space).write("a");
      assert_eq!(render(&tags), " a");
   }

   #[test]
   fn wide_group_forces_break() {
      // Idiomatic separator pattern: a space when flat, a break when broken.
      let mut tags = Tags::new();
      tags.write_with(Tag::Group(5), |tags| {
         tags
            .write("aaaaaa")
            .write_if(TagCondition::Flat, Tag::Space)
            .write_if(TagCondition::Broken, Tag::Break(0))
            .write("b");
      });
      assert_eq!(render(&tags), "aaaaaa\nb");
   }

   #[test]
   fn narrow_group_stays_flat() {
      let mut tags = Tags::new();
      tags.write_with(Tag::Group(MAX_COLUMN), |tags| {
         tags
            .write("a")
            .write_if(TagCondition::Flat, Tag::Space)
            .write_if(TagCondition::Broken, Tag::Break(0))
            .write("b");
      });
      assert_eq!(render(&tags), "a b");
   }
}
