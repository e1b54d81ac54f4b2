use std::fmt;

use dot_doc::{
   Doc,
   Format as DocFormat,
   MAX_COLUMN,
   TagCondition,
   wrap,
};
use dot_report::Diagnostics;

use crate::{
   kind::Kind::{
      self,
      *,
   },
   parser::Parser,
   token::Token,
   tree::{
      Child,
      Tree,
   },
};

const INDENT: isize = 4;

/// Why [`Printer::print`] declined to produce output.
#[derive(Debug)]
pub enum PrintError {
   /// The input did not parse cleanly; formatting a tree with errors would
   /// risk silently dropping or misplacing the offending tokens.
   Diagnostics(Diagnostics),
   /// The output writer itself failed.
   Io(dot_report::Error),
}

impl fmt::Display for PrintError {
   fn fmt(&self, writer: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Self::Diagnostics(diagnostics) => write!(writer, "{diagnostics}"),
         Self::Io(error) => write!(writer, "{error}"),
      }
   }
}

impl From<fmt::Error> for PrintError {
   fn from(error: fmt::Error) -> Self {
      Self::Io(error.into())
   }
}

/// Canonicalises DOT source into this crate's one fixed style.
///
/// Never runs on a source that failed to parse cleanly: formatting is
/// all-or-nothing, matching the "no partial output" non-goal.
pub struct Printer;

impl Printer {
   /// Parses `source` and, if it is diagnostic-free, writes the canonical
   /// rendering to `writer` followed by a trailing newline (omitted only
   /// when the input holds no graphs at all).
   ///
   /// # Errors
   /// Returns the parse diagnostics if `source` didn't parse cleanly, or
   /// propagates a writer failure.
   pub fn print(source: &str, writer: &mut dyn fmt::Write) -> Result<(), PrintError> {
      let (tree, diagnostics) = Parser::new(source).parse();

      if !diagnostics.is_empty() {
         return Err(PrintError::Diagnostics(diagnostics));
      }

      let doc = print_file(&tree);
      doc.render(writer, DocFormat::Default)?;

      if !tree.children.is_empty() {
         writer.write_char('\n')?;
      }

      Ok(())
   }
}

fn print_file(tree: &Tree) -> Doc<'_> {
   let mut doc = Doc::new();
   let mut first = true;

   for child in &tree.children {
      match child {
         Child::Tree(t) if t.kind == GRAPH => {
            if !first {
               doc = doc.break_(1);
            }
            first = false;
            doc = print_graph(doc, t);
         },
         Child::Token(t) if t.kind == TOKEN_COMMENT => {
            if !first {
               doc = doc.break_(0);
            }
            first = false;
            doc = print_comment(doc, t);
         },
         _ => {},
      }
   }

   doc
}

/// `Graph ::= 'strict'? ('graph' | 'digraph') ID? '{' StmtList '}'`
fn print_graph<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc;

   for child in &tree.children {
      doc = match child {
         Child::Token(t) if t.kind == TOKEN_KEYWORD_STRICT => doc.text("strict").space(),
         Child::Token(t) if matches!(t.kind, TOKEN_KEYWORD_GRAPH | TOKEN_KEYWORD_DIGRAPH) => {
            doc.text(t.literal.to_ascii_lowercase()).space()
         },
         Child::Tree(t) if t.kind == ID => print_id_like(doc, t).space(),
         Child::Token(t) if t.kind == TOKEN_LEFT_BRACE => doc.text("{"),
         Child::Tree(t) if t.kind == STMT_LIST => print_braced_stmt_list(doc, t),
         Child::Token(t) if t.kind == TOKEN_RIGHT_BRACE => doc.text("}"),
         Child::Token(t) if t.kind == TOKEN_COMMENT => print_comment(doc, t),
         _ => doc,
      };
   }

   doc
}

/// Prints a `StmtList` already wrapped in its enclosing `{`/`}`: opens on
/// its own indented block, one statement or comment per line, and leaves
/// the closing brace at the outer indent. Produces nothing for an empty
/// list so `{}` stays adjacent.
fn print_braced_stmt_list<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   if tree.children.is_empty() {
      return doc;
   }

   doc
      .indent(INDENT, |doc| {
         let mut doc = doc.break_(0);

         for (index, child) in tree.children.iter().enumerate() {
            if index > 0 {
               doc = doc.break_(0);
            }

            doc = match child {
               Child::Tree(stmt) => print_stmt(doc, stmt),
               Child::Token(comment) => print_comment(doc, comment),
            };
         }

         doc
      })
      .break_(0)
}

/// `Stmt ::= Attribute | AttrStmt | Subgraph | NodeStmt | EdgeStmt`
fn print_stmt<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   match tree.kind {
      ATTRIBUTE => print_attribute(doc, tree),
      ATTR_STMT => print_attr_stmt(doc, tree),
      SUBGRAPH => print_subgraph(doc, tree),
      NODE_STMT => print_node_stmt(doc, tree),
      EDGE_STMT => print_edge_stmt(doc, tree),
      _ => doc,
   }
}

/// `Attribute ::= AttrName '=' AttrValue`
fn print_attribute<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc;

   for child in &tree.children {
      doc = match child {
         Child::Tree(t) if matches!(t.kind, ATTR_NAME | ATTR_VALUE) => print_id_like(doc, t),
         Child::Token(t) if t.kind == TOKEN_EQUAL => doc.space().text("=").space(),
         Child::Token(t) if t.kind == TOKEN_COMMENT => print_comment(doc, t),
         _ => doc,
      };
   }

   doc
}

/// `AttrStmt ::= ('graph' | 'node' | 'edge') AttrList`
fn print_attr_stmt<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc;

   for child in &tree.children {
      doc = match child {
         Child::Token(t) if matches!(t.kind, TOKEN_KEYWORD_GRAPH | TOKEN_KEYWORD_NODE | TOKEN_KEYWORD_EDGE) => {
            doc.text(t.literal.to_ascii_lowercase()).space()
         },
         Child::Tree(t) if t.kind == ATTR_LIST => print_attr_list(doc, t),
         Child::Token(t) if t.kind == TOKEN_COMMENT => print_comment(doc, t),
         _ => doc,
      };
   }

   doc
}

/// `AttrList ::= ('[' AList? ']')+`
///
/// A pair is forced vertical (one attribute per line, closing `]` on its
/// own line) when it holds more than one attribute, when there is more
/// than one bracket pair in this `AttrList`, or when a comment trails its
/// last attribute — matching the single-attribute inline exception the
/// printer rules call out. A pair that stays eligible for the inline form
/// is still measured against [`MAX_COLUMN`] by [`Doc::group`], so a single
/// attribute whose value alone overruns the column budget still wraps.
fn print_attr_list<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let bracket_pairs = tree
      .children
      .iter()
      .filter(|child| matches!(child, Child::Token(t) if t.kind == TOKEN_LEFT_BRACKET))
      .count();

   let mut doc = doc;
   let mut index = 0;

   while index < tree.children.len() {
      match &tree.children[index] {
         Child::Token(t) if t.kind == TOKEN_LEFT_BRACKET => {
            let a_list = match tree.children.get(index + 1) {
               Some(Child::Tree(a_list)) if a_list.kind == A_LIST => Some(a_list),
               _ => None,
            };
            if a_list.is_some() {
               index += 1;
            }

            // A comment may trail the last attribute, threaded in ahead of
            // the real closing bracket token rather than nested inside
            // `A_LIST`.
            let mut comments: Vec<&Token> = Vec::new();
            while let Some(Child::Token(t)) = tree.children.get(index + 1) {
               if t.kind != TOKEN_COMMENT {
                  break;
               }
               comments.push(t);
               index += 1;
            }

            let attr_count = a_list.map_or(0, |a_list| {
               a_list.children.iter().filter(|child| matches!(child, Child::Tree(t) if t.kind == ATTRIBUTE)).count()
            });
            let vertical = bracket_pairs > 1 || attr_count > 1 || !comments.is_empty();
            let group_max = if vertical { 0 } else { MAX_COLUMN };

            doc = doc.space().group(group_max, |doc| {
               let mut doc = doc.text("[");

               if let Some(a_list) = a_list {
                  doc = doc.indent(INDENT, |doc| {
                     let doc = doc.break_if(TagCondition::Broken, 0);
                     print_a_list(doc, a_list)
                  });
               }

               for comment in &comments {
                  doc = doc.space_if(TagCondition::Flat).break_if(TagCondition::Broken, 0);
                  doc = print_comment(doc, comment);
               }

               doc.break_if(TagCondition::Broken, 0).text("]")
            });

            if matches!(tree.children.get(index + 1), Some(Child::Token(t)) if t.kind == TOKEN_RIGHT_BRACKET) {
               index += 1;
            }
         },
         Child::Token(t) if t.kind == TOKEN_COMMENT => doc = print_comment(doc, t),
         _ => {},
      }

      index += 1;
   }

   doc
}

/// `AList ::= Attribute ((';' | ',') ? Attribute)*`
///
/// Separators defer to the enclosing group: `", "` flat, a bare break
/// broken. The caller picks the group's budget, forcing broken whenever
/// the vertical rules demand it.
fn print_a_list<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc;
   let mut first = true;

   for child in &tree.children {
      match child {
         Child::Tree(t) if t.kind == ATTRIBUTE => {
            if !first {
               doc = doc
                  .text_if(TagCondition::Flat, ",")
                  .space_if(TagCondition::Flat)
                  .break_if(TagCondition::Broken, 0);
            }
            first = false;
            doc = print_attribute(doc, t);
         },
         Child::Token(t) if t.kind == TOKEN_COMMENT => doc = print_comment(doc, t),
         _ => {},
      }
   }

   doc
}

/// `NodeID ::= ID Port?`
fn print_node_id<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc;

   for child in &tree.children {
      doc = match child {
         Child::Tree(t) if t.kind == ID => print_id_like(doc, t),
         Child::Tree(t) if t.kind == PORT => print_port(doc, t),
         _ => doc,
      };
   }

   doc
}

/// `Port ::= ':' ID (':' compassOrID)? | ':' compassPoint`
fn print_port<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc;

   for child in &tree.children {
      doc = match child {
         Child::Token(t) if t.kind == TOKEN_COLON => doc.text(":"),
         Child::Tree(t) if matches!(t.kind, ID | COMPASS_POINT) => print_id_like(doc, t),
         _ => doc,
      };
   }

   doc
}

/// `NodeStmt ::= NodeID AttrList?`
fn print_node_stmt<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc;

   for child in &tree.children {
      doc = match child {
         Child::Tree(t) if t.kind == NODE_ID => print_node_id(doc, t),
         Child::Tree(t) if t.kind == ATTR_LIST => print_attr_list(doc, t),
         Child::Token(t) if t.kind == TOKEN_COMMENT => print_comment(doc, t),
         _ => doc,
      };
   }

   doc
}

/// `EdgeStmt ::= (NodeID | Subgraph) (edgeop (NodeID | Subgraph))+ AttrList?`
///
/// The node/edgeop chain is grouped against [`MAX_COLUMN`] on its own, so a
/// chain that overruns the column budget wraps one hop per line, indented,
/// while a short chain stays on one line. The trailing `AttrList`/comment
/// sit outside that group: they make their own wrapping decisions.
fn print_edge_stmt<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc.group(MAX_COLUMN, |doc| {
      doc.indent(INDENT, |doc| {
         let mut doc = doc;

         for child in &tree.children {
            doc = match child {
               Child::Tree(t) if t.kind == NODE_ID => print_node_id(doc, t).space(),
               Child::Tree(t) if t.kind == SUBGRAPH => print_subgraph(doc, t).space(),
               Child::Token(t) if matches!(t.kind, TOKEN_UNDIRECTED_EDGE | TOKEN_DIRECTED_EDGE) => {
                  doc.break_if(TagCondition::Broken, 0).text(t.literal.clone()).space()
               },
               _ => doc,
            };
         }

         doc
      })
   });

   for child in &tree.children {
      doc = match child {
         Child::Tree(t) if t.kind == ATTR_LIST => print_attr_list(doc, t),
         Child::Token(t) if t.kind == TOKEN_COMMENT => print_comment(doc, t),
         _ => doc,
      };
   }

   doc
}

/// `Subgraph ::= ('subgraph' ID?)? '{' StmtList '}'`
///
/// Always canonicalised to the `subgraph` keyword form, whether or not the
/// source used the braceless anonymous spelling.
fn print_subgraph<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc.text("subgraph");

   for child in &tree.children {
      doc = match child {
         Child::Token(t) if t.kind == TOKEN_KEYWORD_SUBGRAPH => doc,
         Child::Tree(t) if t.kind == ID => print_id_like(doc.space(), t),
         Child::Token(t) if t.kind == TOKEN_LEFT_BRACE => doc.space().text("{"),
         Child::Tree(t) if t.kind == STMT_LIST => print_braced_stmt_list(doc, t),
         Child::Token(t) if t.kind == TOKEN_RIGHT_BRACE => doc.text("}"),
         Child::Token(t) if t.kind == TOKEN_COMMENT => print_comment(doc, t),
         _ => doc,
      };
   }

   doc
}

/// Any tree that wraps exactly one `ID`-shaped token: `ID`, `AttrName`,
/// `AttrValue`, `CompassPoint`. May additionally carry leading comment
/// tokens threaded in ahead of the identifier itself.
fn print_id_like<'a>(doc: Doc<'a>, tree: &'a Tree) -> Doc<'a> {
   let mut doc = doc;

   for token in tree.tokens() {
      doc = if token.kind == TOKEN_COMMENT {
         print_comment(doc, token)
      } else {
         print_identifier_literal(doc, &token.literal)
      };
   }

   doc
}

/// Prints an identifier literal verbatim, unless it is too long to fit on
/// one line: then it is (re-)quoted and split across `\`-continued lines,
/// each chunk sized to leave room for the trailing backslash.
fn print_identifier_literal<'a>(doc: Doc<'a>, literal: &str) -> Doc<'a> {
   if literal.chars().count() <= MAX_COLUMN {
      return doc.text(literal.to_owned());
   }

   let body = if literal.len() > 1 && literal.starts_with('"') && literal.ends_with('"') {
      literal[1..literal.len() - 1].to_owned()
   } else {
      literal.to_owned()
   };

   let chars: Vec<char> = body.chars().collect();
   let budget = MAX_COLUMN.saturating_sub(2).max(1);

   let mut doc = doc.text("\"");
   let mut index = 0;

   while index < chars.len() {
      let end = (index + budget).min(chars.len());
      doc = doc.text(chars[index..end].iter().collect::<String>());
      index = end;

      if index < chars.len() {
         doc = doc.text("\\").break_(0);
      }
   }

   doc.text("\"")
}

/// Re-synthesises a comment's marker as `//`, regardless of its original
/// form (`#…`, `/*…*/`), and word-wraps long bodies at `MAX_COLUMN`.
///
/// `//` runs to the end of its line, so this always forces a break after
/// itself — whatever follows a comment in the tree (a sibling token or the
/// next statement) must start on a fresh line, never glued onto the `//`.
fn print_comment<'a>(doc: Doc<'a>, token: &Token) -> Doc<'a> {
   let body = comment_body(&token.literal);
   let lines = wrap(&body, MAX_COLUMN.saturating_sub(3));

   let mut doc = doc;
   for (index, line) in lines.iter().enumerate() {
      if index > 0 {
         doc = doc.break_(0);
      }
      doc = doc.text(format!("// {line}"));
   }

   if lines.is_empty() {
      doc = doc.text("//");
   }

   doc.break_(0)
}

fn comment_body(literal: &str) -> String {
   if let Some(rest) = literal.strip_prefix("//") {
      rest.trim().to_owned()
   } else if let Some(rest) = literal.strip_prefix('#') {
      rest.trim().to_owned()
   } else if let Some(rest) = literal.strip_prefix("/*") {
      rest.strip_suffix("*/").unwrap_or(rest).trim().to_owned()
   } else {
      literal.trim().to_owned()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn print(source: &str) -> Result<String, PrintError> {
      let mut out = String::new();
      Printer::print(source, &mut out)?;
      Ok(out)
   }

   #[test]
   fn scenario_empty_input() {
      assert_eq!(print("").unwrap(), "");
   }

   #[test]
   fn scenario_minimal_digraph() {
      assert_eq!(print("digraph {}").unwrap(), "digraph {}\n");
   }

   #[test]
   fn scenario_strict_graph_with_attribute() {
      let out = print("strict graph fruits { rank = same }").unwrap();
      assert_eq!(out, "strict graph fruits {\n    rank = same\n}\n");
   }

   #[test]
   fn scenario_invalid_character_yields_no_output() {
      let error = print("digraph { a@b }").unwrap_err();
      assert!(matches!(error, PrintError::Diagnostics(_)));
   }

   #[test]
   fn keyword_casing_is_canonicalised() {
      let out = print("DIGRAPH { A -> B }").unwrap();
      assert!(out.starts_with("digraph"));
   }

   #[test]
   fn single_attribute_stays_inline() {
      let out = print("digraph { a [color=red] }").unwrap();
      assert!(out.contains("a [color = red]"), "{out}");
   }

   #[test]
   fn multiple_attributes_go_vertical() {
      let out = print("digraph { a [color=red, shape=box] }").unwrap();
      assert!(out.contains("color = red"));
      assert!(out.contains("shape = box"));
      assert!(out.contains("a [\n"), "{out}");
   }

   #[test]
   fn idempotent_on_its_own_output() {
      let first = print("digraph{a->b;a->c}").unwrap();
      let second = print(&first).unwrap();
      assert_eq!(first, second);
   }

   #[test]
   fn block_and_hash_comments_normalise_to_slash_slash() {
      let out = print("graph {\n  # hello\n  a\n}").unwrap();
      assert!(out.contains("// hello"));
      assert!(!out.contains('#'));
   }

   #[test]
   fn braceless_subgraph_is_canonicalised_with_keyword() {
      let out = print("graph { { a } }").unwrap();
      assert!(out.contains("subgraph {"), "{out}");
   }

   #[test]
   fn port_and_compass_point_render() {
      let out = print("digraph { a:f0:n -> b }").unwrap();
      assert!(out.contains("a:f0:n"), "{out}");
   }

   #[test]
   fn trailing_comment_before_closing_brace_is_idempotent() {
      let first = print("graph {\n  a // note\n}").unwrap();
      assert!(!first.contains("// note}"), "comment swallowed the closing brace: {first}");
      let second = print(&first).unwrap();
      assert_eq!(first, second);
   }

   #[test]
   fn comment_before_closing_bracket_is_idempotent() {
      let first = print("digraph { a [color = red // note\n] }").unwrap();
      assert!(first.contains(']'), "{first}");
      let second = print(&first).unwrap();
      assert_eq!(first, second);
   }

   #[test]
   fn long_edge_chain_wraps_one_hop_per_line() {
      let out = print(
         "digraph { aaaaaaaaaaaaaaaaaaaa -> bbbbbbbbbbbbbbbbbbbb -> \
          ccccccccccccccccccccccc -> ddddddddddddddddddddddddd -> \
          eeeeeeeeeeeeeeeeeeeeeeeeeeeee -> fffffffffffffffffffffffffffff }",
      )
      .unwrap();
      assert!(out.lines().any(|line| line.trim_start().starts_with("->")), "{out}");
   }

   #[test]
   fn short_edge_chain_stays_on_one_line() {
      let out = print("digraph { a -> b -> c }").unwrap();
      assert!(out.contains("a -> b -> c"), "{out}");
   }
}
