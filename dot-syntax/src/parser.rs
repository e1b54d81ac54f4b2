use std::collections::VecDeque;

use dot_report::{
   Diagnostic,
   Diagnostics,
};
use dot_span::Position;
use enumset::EnumSet;

use crate::{
   kind::Kind::{
      self,
      *,
   },
   scanner::Scanner,
   token::Token,
   tree::{
      Child,
      Tree,
   },
};

fn is_compass_literal(s: &str) -> bool {
   matches!(s, "n" | "ne" | "e" | "se" | "s" | "sw" | "w" | "nw" | "c" | "_")
}

/// A slot of lookahead: the comments that preceded `token` (not yet
/// attached to any tree) paired with the token itself.
struct Slot {
   comments: Vec<Token>,
   token: Token,
}

/// Recursive-descent parser over a [`Scanner`]'s token stream, building an
/// owned [`Tree`]/[`Child`] arena.
///
/// Comments are threaded structurally: a [`Slot`]'s buffered comments are
/// spliced into whichever production ends up consuming its token, as
/// leading siblings. This is a deliberate simplification of the strict
/// same-line/next-line attachment rule — see `DESIGN.md`.
pub struct Parser<'a> {
   scanner: Scanner<'a>,
   queue: VecDeque<Slot>,
   diagnostics: Diagnostics,
   directed: bool,
}

impl<'a> Parser<'a> {
   #[must_use]
   pub fn new(source: &'a str) -> Self {
      Self {
         scanner: Scanner::new(source),
         queue: VecDeque::new(),
         diagnostics: Diagnostics::new(),
         directed: false,
      }
   }

   /// Parses the whole file and returns the resulting tree together with
   /// every diagnostic collected along the way, in source-position order.
   #[must_use]
   pub fn parse(mut self) -> (Tree, Diagnostics) {
      let mut children = Vec::new();

      loop {
         match self.peek() {
            TOKEN_EOF => break,
            TOKEN_KEYWORD_STRICT | TOKEN_KEYWORD_GRAPH | TOKEN_KEYWORD_DIGRAPH => {
               children.push(Child::Tree(self.parse_graph()));
            },
            _ => {
               let pos = self.peek_pos();
               let mut error_children = Vec::new();
               self.consume(&mut error_children);
               self.diagnostics
                  .push(Diagnostic::new(pos, format!("expected a graph, got {}", self.last_name())));
               children.push(Child::Tree(Tree::new(ERROR_TREE, error_children)));
            },
         }
      }

      (Tree::new(FILE, children), self.diagnostics)
   }

   // -- lookahead -----------------------------------------------------

   fn fill_to(&mut self, n: usize) {
      while self.queue.len() <= n {
         let mut comments = Vec::new();

         let token = loop {
            let token = self.scanner.next();

            if token.kind == TOKEN_COMMENT {
               comments.push(token);
            } else {
               break token;
            }
         };

         self.queue.push_back(Slot { comments, token });
      }
   }

   fn peek(&mut self) -> Kind {
      self.fill_to(0);
      self.queue[0].token.kind
   }

   fn peek2(&mut self) -> Kind {
      self.fill_to(1);
      self.queue[1].token.kind
   }

   fn peek_pos(&mut self) -> Position {
      self.fill_to(0);
      self.queue[0].token.start
   }

   fn peek_literal(&mut self) -> String {
      self.fill_to(0);
      self.queue[0].token.literal.clone()
   }

   /// The name of the most recently peeked token kind, for error messages.
   fn last_name(&mut self) -> &'static str {
      self.peek();
      self.queue[0].token.kind.name()
   }

   // -- primitives ------------------------------------------------------

   /// Unconditionally consumes the next token (and its leading comments)
   /// into `children`. Also records a diagnostic if the token itself is an
   /// `ERROR` token produced by the scanner.
   fn consume(&mut self, children: &mut Vec<Child>) -> Kind {
      self.fill_to(0);
      let slot = self.queue.pop_front().unwrap();

      children.extend(slot.comments.into_iter().map(Child::Token));

      let kind = slot.token.kind;
      if let Some(message) = slot.token.error.clone() {
         self.diagnostics.push(Diagnostic::new(slot.token.start, message));
      }

      children.push(Child::Token(slot.token));
      kind
   }

   /// Consumes the next token if it is in `set`, else leaves it alone.
   fn optional(&mut self, children: &mut Vec<Child>, set: EnumSet<Kind>) -> Option<Kind> {
      if set.contains(self.peek()) {
         Some(self.consume(children))
      } else {
         None
      }
   }

   /// Consumes the next token if it is in `expected`. Otherwise records a
   /// diagnostic (via `message`) and skips tokens into a trailing
   /// `ErrorTree` until one in `expected` or `recovery` (or end of file)
   /// turns up, then retries once.
   fn expect_with(
      &mut self,
      children: &mut Vec<Child>,
      expected: EnumSet<Kind>,
      recovery: EnumSet<Kind>,
      message: impl FnOnce(Kind) -> String,
   ) -> Option<Kind> {
      if expected.contains(self.peek()) {
         return Some(self.consume(children));
      }

      let unexpected = self.peek();
      let unexpected_pos = self.peek_pos();
      let mut error_children = Vec::new();

      while !(expected.contains(self.peek()) || recovery.contains(self.peek()) || self.peek() == TOKEN_EOF) {
         self.consume(&mut error_children);
      }

      self.diagnostics.push(Diagnostic::new(unexpected_pos, message(unexpected)));

      if !error_children.is_empty() {
         children.push(Child::Tree(Tree::new(ERROR_TREE, error_children)));
      }

      if expected.contains(self.peek()) {
         Some(self.consume(children))
      } else {
         None
      }
   }

   fn expect(&mut self, children: &mut Vec<Child>, expected: EnumSet<Kind>, recovery: EnumSet<Kind>) -> Option<Kind> {
      self.expect_with(children, expected, recovery, |got| expected_message(got, expected))
   }

   // -- grammar -----------------------------------------------------------

   /// `Graph ::= 'strict'? ('graph' | 'digraph') ID? '{' StmtList '}'`
   fn parse_graph(&mut self) -> Tree {
      let mut children = Vec::new();

      self.optional(&mut children, TOKEN_KEYWORD_STRICT.into());

      let kind = self.expect(
         &mut children,
         TOKEN_KEYWORD_GRAPH | TOKEN_KEYWORD_DIGRAPH,
         Kind::RECOVERY | TOKEN_LEFT_BRACE,
      );

      let outer_directed = self.directed;
      self.directed = kind == Some(TOKEN_KEYWORD_DIGRAPH);

      if Kind::IDS.contains(self.peek()) {
         children.push(Child::Tree(self.parse_id()));
      }

      self.expect(&mut children, TOKEN_LEFT_BRACE.into(), Kind::RECOVERY);
      children.push(Child::Tree(self.parse_stmt_list()));
      self.expect(&mut children, TOKEN_RIGHT_BRACE.into(), Kind::RECOVERY);

      self.directed = outer_directed;
      Tree::new(GRAPH, children)
   }

   /// `ID` as a standalone tree (graph names, attribute names/values,
   /// node names all reduce to the same wrapped token).
   fn parse_id(&mut self) -> Tree {
      let mut children = Vec::new();
      self.expect(&mut children, TOKEN_ID.into(), EnumSet::empty());
      Tree::new(ID, children)
   }

   /// `StmtList ::= (Stmt ';'?)*`
   fn parse_stmt_list(&mut self) -> Tree {
      let mut children = Vec::new();

      loop {
         match self.peek() {
            TOKEN_RIGHT_BRACE | TOKEN_EOF => break,
            kind if Kind::STMT_START.contains(kind) => {
               children.push(Child::Tree(self.parse_stmt()));
               self.optional(&mut children, TOKEN_SEMICOLON.into());
            },
            _ => {
               let pos = self.peek_pos();
               let got = self.last_name();
               let mut error_children = Vec::new();
               self.consume(&mut error_children);
               self.diagnostics
                  .push(Diagnostic::new(pos, format!("unexpected {got} in statement list")));
               children.push(Child::Tree(Tree::new(ERROR_TREE, error_children)));
            },
         }
      }

      Tree::new(STMT_LIST, children)
   }

   /// `Stmt ::= Attribute | AttrStmt | Subgraph | NodeStmt | EdgeStmt`
   fn parse_stmt(&mut self) -> Tree {
      let kind = self.peek();

      if matches!(kind, TOKEN_KEYWORD_GRAPH | TOKEN_KEYWORD_NODE | TOKEN_KEYWORD_EDGE) {
         self.parse_attr_stmt()
      } else if matches!(kind, TOKEN_KEYWORD_SUBGRAPH | TOKEN_LEFT_BRACE) {
         self.parse_subgraph_stmt_or_edge_stmt()
      } else if self.peek2() == TOKEN_EQUAL {
         self.parse_attribute()
      } else {
         self.parse_node_stmt_or_edge_stmt()
      }
   }

   /// `Attribute ::= AttrName '=' AttrValue`
   fn parse_attribute(&mut self) -> Tree {
      let mut children = Vec::new();

      let mut name_children = Vec::new();
      self.expect(&mut name_children, TOKEN_ID.into(), EnumSet::empty());
      children.push(Child::Tree(Tree::new(ATTR_NAME, name_children)));

      self.expect(
         &mut children,
         TOKEN_EQUAL.into(),
         Kind::RECOVERY | TOKEN_SEMICOLON | TOKEN_COMMA | TOKEN_RIGHT_BRACKET,
      );

      let mut value_children = Vec::new();
      self.expect(&mut value_children, TOKEN_ID.into(), EnumSet::empty());
      children.push(Child::Tree(Tree::new(ATTR_VALUE, value_children)));

      Tree::new(ATTRIBUTE, children)
   }

   /// `AttrStmt ::= ('graph' | 'node' | 'edge') AttrList`
   fn parse_attr_stmt(&mut self) -> Tree {
      let mut children = Vec::new();
      self.expect(
         &mut children,
         TOKEN_KEYWORD_GRAPH | TOKEN_KEYWORD_NODE | TOKEN_KEYWORD_EDGE,
         Kind::RECOVERY,
      );
      children.push(Child::Tree(self.parse_attr_list()));
      Tree::new(ATTR_STMT, children)
   }

   /// `AttrList ::= ('[' AList? ']')+`
   fn parse_attr_list(&mut self) -> Tree {
      let mut children = Vec::new();

      loop {
         self.expect(&mut children, TOKEN_LEFT_BRACKET.into(), Kind::RECOVERY | TOKEN_RIGHT_BRACKET);

         if Kind::IDS.contains(self.peek()) {
            children.push(Child::Tree(self.parse_a_list()));
         }

         self.expect(&mut children, TOKEN_RIGHT_BRACKET.into(), Kind::RECOVERY);

         if self.peek() != TOKEN_LEFT_BRACKET {
            break;
         }
      }

      Tree::new(ATTR_LIST, children)
   }

   /// `AList ::= Attribute ((';' | ',')? Attribute)*`
   fn parse_a_list(&mut self) -> Tree {
      let mut children = Vec::new();
      children.push(Child::Tree(self.parse_attribute()));

      loop {
         self.optional(&mut children, TOKEN_SEMICOLON | TOKEN_COMMA);

         if Kind::IDS.contains(self.peek()) {
            children.push(Child::Tree(self.parse_attribute()));
         } else {
            break;
         }
      }

      Tree::new(A_LIST, children)
   }

   /// `NodeID ::= ID Port?`
   fn parse_node_id(&mut self) -> Tree {
      let mut children = Vec::new();
      children.push(Child::Tree(self.parse_id()));

      if self.peek() == TOKEN_COLON {
         children.push(Child::Tree(self.parse_port()));
      }

      Tree::new(NODE_ID, children)
   }

   /// `Port ::= ':' ID (':' compassOrID)? | ':' compassPoint`
   ///
   /// Lexically a compass point is just an `ID`; the second segment (or the
   /// first, when there is no second) is re-tagged `CompassPoint` when its
   /// literal matches the fixed compass-point vocabulary.
   fn parse_port(&mut self) -> Tree {
      let mut children = Vec::new();
      self.expect(&mut children, TOKEN_COLON.into(), Kind::RECOVERY);

      let first_literal = self.peek_literal();
      let mut first_children = Vec::new();
      self.expect(&mut first_children, TOKEN_ID.into(), Kind::RECOVERY | TOKEN_COLON);

      if self.peek() == TOKEN_COLON {
         children.push(Child::Tree(Tree::new(ID, first_children)));
         self.consume(&mut children);

         let second_literal = self.peek_literal();
         let mut second_children = Vec::new();
         self.expect(&mut second_children, TOKEN_ID.into(), Kind::RECOVERY);

         let second_kind = if is_compass_literal(&second_literal) { COMPASS_POINT } else { ID };
         children.push(Child::Tree(Tree::new(second_kind, second_children)));
      } else {
         let first_kind = if is_compass_literal(&first_literal) { COMPASS_POINT } else { ID };
         children.push(Child::Tree(Tree::new(first_kind, first_children)));
      }

      Tree::new(PORT, children)
   }

   /// `Subgraph ::= ('subgraph' ID?)? '{' StmtList '}'`
   ///
   /// A braceless subgraph (no leading `subgraph` keyword) never takes an
   /// ID of its own — an ID right after `{` starts a `NodeStmt` inside the
   /// subgraph's statement list instead.
   fn parse_subgraph(&mut self) -> Tree {
      let mut children = Vec::new();

      if self.peek() == TOKEN_KEYWORD_SUBGRAPH {
         self.consume(&mut children);

         if Kind::IDS.contains(self.peek()) {
            children.push(Child::Tree(self.parse_id()));
         }
      }

      self.expect(&mut children, TOKEN_LEFT_BRACE.into(), Kind::RECOVERY);
      children.push(Child::Tree(self.parse_stmt_list()));
      self.expect(&mut children, TOKEN_RIGHT_BRACE.into(), Kind::RECOVERY);

      Tree::new(SUBGRAPH, children)
   }

   fn parse_node_stmt_or_edge_stmt(&mut self) -> Tree {
      let node_id = Child::Tree(self.parse_node_id());

      if matches!(self.peek(), TOKEN_UNDIRECTED_EDGE | TOKEN_DIRECTED_EDGE) {
         self.parse_edge_stmt_from(node_id)
      } else {
         let mut children = vec![node_id];

         if self.peek() == TOKEN_LEFT_BRACKET {
            children.push(Child::Tree(self.parse_attr_list()));
         }

         Tree::new(NODE_STMT, children)
      }
   }

   fn parse_subgraph_stmt_or_edge_stmt(&mut self) -> Tree {
      let subgraph = self.parse_subgraph();

      if matches!(self.peek(), TOKEN_UNDIRECTED_EDGE | TOKEN_DIRECTED_EDGE) {
         self.parse_edge_stmt_from(Child::Tree(subgraph))
      } else {
         subgraph
      }
   }

   /// `EdgeStmt ::= (NodeID | Subgraph) (edgeop (NodeID | Subgraph))+ AttrList?`
   ///
   /// The directedness gate checks each `edgeop` against the enclosing
   /// graph's directedness and records a diagnostic (but still accepts and
   /// keeps the token) on a mismatch.
   fn parse_edge_stmt_from(&mut self, lhs: Child) -> Tree {
      let mut children = vec![lhs];

      while matches!(self.peek(), TOKEN_UNDIRECTED_EDGE | TOKEN_DIRECTED_EDGE) {
         let op_kind = self.peek();
         let op_pos = self.peek_pos();
         self.consume(&mut children);

         match (self.directed, op_kind) {
            (true, TOKEN_UNDIRECTED_EDGE) => self
               .diagnostics
               .push(Diagnostic::new(op_pos, "expected '->' for edge in directed graph")),
            (false, TOKEN_DIRECTED_EDGE) => self
               .diagnostics
               .push(Diagnostic::new(op_pos, "expected '--' for edge in undirected graph")),
            _ => {},
         }

         match self.peek() {
            TOKEN_ID => children.push(Child::Tree(self.parse_node_id())),
            TOKEN_LEFT_BRACE | TOKEN_KEYWORD_SUBGRAPH => children.push(Child::Tree(self.parse_subgraph())),
            _ => {
               let pos = self.peek_pos();
               self.diagnostics
                  .push(Diagnostic::new(pos, "expected node or subgraph as edge operand"));
               break;
            },
         }
      }

      if self.peek() == TOKEN_LEFT_BRACKET {
         children.push(Child::Tree(self.parse_attr_list()));
      }

      Tree::new(EDGE_STMT, children)
   }
}

/// `"expected A, B or C, got D"`, in `expected`'s declaration order.
fn expected_message(got: Kind, expected: EnumSet<Kind>) -> String {
   let names: Vec<&str> = expected.iter().map(Kind::name).collect();

   let expected_part = match names.as_slice() {
      [] => "end of file".to_owned(),
      [only] => (*only).to_owned(),
      [rest @ .., last] => format!("{} or {last}", rest.join(", ")),
   };

   let got_part = if got == TOKEN_EOF { "end of file" } else { got.name() };

   format!("expected {expected_part}, got {got_part}")
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::tree::Format;

   fn parse(source: &str) -> (Tree, Diagnostics) {
      Parser::new(source).parse()
   }

   fn render(tree: &Tree) -> String {
      let mut out = String::new();
      tree.render(&mut out, Format::Scheme).unwrap();
      out
   }

   #[test]
   fn minimal_digraph_has_no_diagnostics() {
      let (_, diagnostics) = parse("digraph { a -> b }");
      assert!(diagnostics.is_empty(), "{diagnostics}");
   }

   #[test]
   fn strict_graph_with_attributes() {
      let (tree, diagnostics) = parse("strict graph G {\n  rank = same;\n  a [color=red]\n}");
      assert!(diagnostics.is_empty(), "{diagnostics}");
      assert!(render(&tree).contains("ATTRIBUTE"));
   }

   #[test]
   fn scenario_invalid_character_mid_identifier() {
      let (_, diagnostics) = parse("digraph { a@b }");
      let message = diagnostics.iter().next().unwrap().to_string();
      assert_eq!(message, "1:11: invalid character '@': unquoted IDs can only contain letters, digits, and underscores");
   }

   #[test]
   fn scenario_missing_edge_operand() {
      let (_, diagnostics) = parse("graph { A -- B -- }");
      let last = diagnostics.iter().last().unwrap();
      assert_eq!(last.to_string(), "1:19: expected node or subgraph as edge operand");
   }

   #[test]
   fn scenario_directedness_mismatch_in_digraph() {
      let (_, diagnostics) = parse("digraph { A -- B }");
      let message = diagnostics.iter().next().unwrap().to_string();
      assert_eq!(message, "1:13: expected '->' for edge in directed graph");
   }

   #[test]
   fn scenario_directedness_mismatch_in_graph() {
      let (_, diagnostics) = parse("graph { A -> B }");
      let message = diagnostics.iter().next().unwrap().to_string();
      assert_eq!(message, "1:13: expected '--' for edge in undirected graph");
   }

   #[test]
   fn braceless_subgraph_has_no_id_of_its_own() {
      let (tree, diagnostics) = parse("graph { { a; b } }");
      assert!(diagnostics.is_empty(), "{diagnostics}");

      let scheme = render(&tree);
      assert!(scheme.contains("SUBGRAPH"));
      assert!(scheme.contains("NODE_STMT"));
   }

   #[test]
   fn named_subgraph_has_an_id() {
      let (tree, diagnostics) = parse("graph { subgraph cluster0 { a } }");
      assert!(diagnostics.is_empty(), "{diagnostics}");
      assert!(render(&tree).contains("ID"));
   }

   #[test]
   fn port_with_compass_point_only() {
      let (tree, diagnostics) = parse("digraph { a:n -> b }");
      assert!(diagnostics.is_empty(), "{diagnostics}");
      assert!(render(&tree).contains("COMPASS_POINT"));
   }

   #[test]
   fn port_with_name_and_compass_point() {
      let (tree, diagnostics) = parse("digraph { a:f0:n -> b }");
      assert!(diagnostics.is_empty(), "{diagnostics}");

      let scheme = render(&tree);
      assert!(scheme.contains("COMPASS_POINT"));
      assert!(scheme.contains("(ID"));
   }

   #[test]
   fn edge_chain_of_three_nodes() {
      let (tree, diagnostics) = parse("digraph { a -> b -> c }");
      assert!(diagnostics.is_empty(), "{diagnostics}");

      let Child::Tree(graph) = &tree.children[0] else {
         panic!("expected a GRAPH child");
      };
      assert_eq!(graph.kind, GRAPH);

      let Child::Tree(stmt_list) = &graph.children[graph.children.len() - 2] else {
         panic!("expected a STMT_LIST child");
      };
      let Child::Tree(edge_stmt) = &stmt_list.children[0] else {
         panic!("expected an EDGE_STMT child");
      };
      assert_eq!(edge_stmt.kind, EDGE_STMT);
      assert_eq!(edge_stmt.tokens().filter(|t| matches!(t.kind, TOKEN_DIRECTED_EDGE)).count(), 2);
   }

   #[test]
   fn trailing_comment_is_threaded_into_the_tree() {
      let (tree, diagnostics) = parse("graph {\n  a // note\n}");
      assert!(diagnostics.is_empty(), "{diagnostics}");
      assert!(render(&tree).contains("TOKEN_COMMENT"));
   }

   #[test]
   fn garbage_at_top_level_recovers() {
      let (tree, diagnostics) = parse("@@@ graph {}");
      assert!(!diagnostics.is_empty());
      assert!(render(&tree).contains("ERROR_TREE"));
      assert!(render(&tree).contains("GRAPH"));
   }

   #[test]
   fn unclosed_brace_still_produces_a_tree() {
      let (tree, diagnostics) = parse("graph { a");
      assert!(!diagnostics.is_empty());
      assert_eq!(tree.kind, FILE);
   }

   #[test]
   fn diagnostics_are_in_source_order() {
      let (_, diagnostics) = parse("digraph { a@b -- c }\ndigraph { d -- e }");
      assert!(diagnostics.is_ordered());
   }
}
