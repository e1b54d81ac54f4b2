use std::fmt;

use dot_span::Position;

use crate::{
   kind::Kind,
   token::Token,
};

/// Which textual form [`Tree::render`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
   /// Tab-indented node names, one per line; tokens rendered as `'literal'`.
   Default,
   /// `(Kind (@ l c l c) children…)`, nested children each on their own
   /// indented line; the position annotation is omitted when invalid.
   Scheme,
}

/// A single child of a [`Tree`]: either a leaf token or a nested subtree.
///
/// The owned tagged-union arena this workspace uses in place of the
/// teacher's interned green/red tree — see `DESIGN.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
   Token(Token),
   Tree(Tree),
}

impl Child {
   #[must_use]
   pub fn start(&self) -> Position {
      match self {
         Self::Token(token) => token.start,
         Self::Tree(tree) => tree.start,
      }
   }

   #[must_use]
   pub fn end(&self) -> Position {
      match self {
         Self::Token(token) => token.end,
         Self::Tree(tree) => tree.end,
      }
   }

   #[must_use]
   pub fn kind(&self) -> Kind {
      match self {
         Self::Token(token) => token.kind,
         Self::Tree(tree) => tree.kind,
      }
   }
}

impl From<Token> for Child {
   fn from(token: Token) -> Self {
      Self::Token(token)
   }
}

impl From<Tree> for Child {
   fn from(tree: Tree) -> Self {
      Self::Tree(tree)
   }
}

/// A node of the concrete syntax tree: a `kind`, an ordered list of
/// children (tokens or subtrees), and the source range it spans.
///
/// `start`/`end` are [`Position::INVALID`] for an empty tree — there is no
/// child to take a position from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
   pub kind: Kind,
   pub children: Vec<Child>,
   pub start: Position,
   pub end: Position,
}

impl Tree {
   #[must_use]
   pub fn new(kind: Kind, children: Vec<Child>) -> Self {
      let start = children.first().map_or(Position::INVALID, Child::start);
      let end = children.last().map_or(Position::INVALID, Child::end);

      Self {
         kind,
         children,
         start,
         end,
      }
   }

   #[must_use]
   pub fn tokens(&self) -> impl Iterator<Item = &Token> {
      self.children.iter().filter_map(|child| match child {
         Child::Token(token) => Some(token),
         Child::Tree(_) => None,
      })
   }

   /// Renders this tree as `format`.
   ///
   /// # Errors
   /// Propagates whatever `writer` fails with.
   pub fn render(&self, writer: &mut dyn fmt::Write, format: Format) -> fmt::Result {
      match format {
         Format::Default => self.render_default(writer, 0),
         Format::Scheme => self.render_scheme(writer, 0),
      }
   }

   fn render_default(&self, writer: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
      for _ in 0..depth {
         writer.write_char('\t')?;
      }
      writeln!(writer, "{}", self.kind)?;

      for child in &self.children {
         match child {
            Child::Token(token) => {
               for _ in 0..=depth {
                  writer.write_char('\t')?;
               }
               writeln!(writer, "'{}'", token.literal)?;
            },
            Child::Tree(tree) => tree.render_default(writer, depth + 1)?,
         }
      }

      Ok(())
   }

   fn render_scheme(&self, writer: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
      for _ in 0..depth {
         writer.write_char(' ')?;
      }

      write!(writer, "({:?}", self.kind)?;
      if self.start.is_valid() && self.end.is_valid() {
         write!(
            writer,
            " (@ {} {} {} {})",
            self.start.line, self.start.column, self.end.line, self.end.column
         )?;
      }

      for child in &self.children {
         writeln!(writer)?;

         match child {
            Child::Token(token) => {
               for _ in 0..=depth {
                  writer.write_char(' ')?;
               }

               write!(writer, "({:?}", token.kind)?;
               write!(
                  writer,
                  " (@ {} {} {} {})",
                  token.start.line, token.start.column, token.end.line, token.end.column
               )?;
               write!(writer, " '{}')", token.literal)?;
            },
            Child::Tree(tree) => tree.render_scheme(writer, depth + 1)?,
         }
      }

      write!(writer, ")")
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::kind::Kind::*;

   fn token(kind: Kind, literal: &str, line: u32, col: u32) -> Token {
      let len = literal.chars().count() as u32;
      Token {
         kind,
         literal: literal.to_owned(),
         start: Position::new(line, col),
         end: Position::new(line, col + len.saturating_sub(1)),
         error: None,
      }
   }

   #[test]
   fn empty_tree_has_invalid_position() {
      let tree = Tree::new(FILE, Vec::new());
      assert!(!tree.start.is_valid());
      assert!(!tree.end.is_valid());
   }

   #[test]
   fn position_derives_from_children() {
      let tree = Tree::new(GRAPH, vec![
         Child::Token(token(TOKEN_KEYWORD_DIGRAPH, "digraph", 1, 1)),
         Child::Token(token(TOKEN_LEFT_BRACE, "{", 1, 9)),
         Child::Token(token(TOKEN_RIGHT_BRACE, "}", 1, 10)),
      ]);

      assert_eq!(tree.start, Position::new(1, 1));
      assert_eq!(tree.end, Position::new(1, 10));
   }

   #[test]
   fn default_render_is_tab_indented() {
      let tree = Tree::new(FILE, vec![Child::Tree(Tree::new(GRAPH, vec![Child::Token(token(
         TOKEN_KEYWORD_GRAPH,
         "graph",
         1,
         1,
      ))]))]);

      let mut out = String::new();
      tree.render(&mut out, Format::Default).unwrap();
      assert_eq!(out, "File\n\tGraph\n\t\t'graph'\n");
   }

   #[test]
   fn scheme_render_includes_positions() {
      let tree = Tree::new(GRAPH, vec![Child::Token(token(TOKEN_KEYWORD_GRAPH, "graph", 1, 1))]);

      let mut out = String::new();
      tree.render(&mut out, Format::Scheme).unwrap();
      assert_eq!(out, "(GRAPH (@ 1 1 1 5)\n (TOKEN_KEYWORD_GRAPH (@ 1 1 1 5) 'graph'))");
   }
}
