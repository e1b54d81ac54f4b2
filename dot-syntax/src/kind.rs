use enumset::{
   EnumSet,
   EnumSetType,
   enum_set,
};

/// The closed set of token and tree kinds.
///
/// A single enum serves both roles: tokens use the `TOKEN_*` variants,
/// trees use everything else. `EnumSetType` gives every kind a bit
/// position, so the parser expresses lookahead and recovery sets as plain
/// `EnumSet<Kind>` unions.
#[derive(Debug, EnumSetType)]
#[enumset(no_super_impls)]
#[expect(non_camel_case_types, reason = "matches the SCREAMING_SNAKE_CASE token/tree vocabulary")]
pub enum Kind {
   TOKEN_LEFT_BRACE,
   TOKEN_RIGHT_BRACE,
   TOKEN_LEFT_BRACKET,
   TOKEN_RIGHT_BRACKET,
   TOKEN_COLON,
   TOKEN_COMMA,
   TOKEN_SEMICOLON,
   TOKEN_EQUAL,

   TOKEN_UNDIRECTED_EDGE,
   TOKEN_DIRECTED_EDGE,

   TOKEN_KEYWORD_GRAPH,
   TOKEN_KEYWORD_DIGRAPH,
   TOKEN_KEYWORD_SUBGRAPH,
   TOKEN_KEYWORD_STRICT,
   TOKEN_KEYWORD_NODE,
   TOKEN_KEYWORD_EDGE,

   TOKEN_ID,

   TOKEN_COMMENT,

   TOKEN_ERROR,

   TOKEN_EOF,

   FILE,
   GRAPH,
   SUBGRAPH,
   STMT_LIST,
   NODE_STMT,
   EDGE_STMT,
   ATTR_STMT,
   NODE_ID,
   PORT,
   COMPASS_POINT,
   ATTR_LIST,
   A_LIST,
   ATTRIBUTE,
   ATTR_NAME,
   ATTR_VALUE,
   ID,
   ERROR_TREE,
}

use Kind::*;

impl Kind {
   /// Keywords that also double as valid unquoted identifiers; the scanner
   /// promotes an unquoted run to one of these on a case-insensitive match.
   pub const KEYWORDS: EnumSet<Kind> = enum_set!(
      TOKEN_KEYWORD_GRAPH
         | TOKEN_KEYWORD_DIGRAPH
         | TOKEN_KEYWORD_SUBGRAPH
         | TOKEN_KEYWORD_STRICT
         | TOKEN_KEYWORD_NODE
         | TOKEN_KEYWORD_EDGE
   );

   /// Token kinds that carry no meaningful diagnostics-affecting content of
   /// their own but must still thread through the tree (comments).
   pub const TRIVIA: EnumSet<Kind> = enum_set!(TOKEN_COMMENT);

   /// Tokens that can begin an identifier/node-id.
   pub const IDS: EnumSet<Kind> = enum_set!(TOKEN_ID);

   /// Tokens that can begin a statement.
   pub const STMT_START: EnumSet<Kind> = enum_set!(
      TOKEN_ID
         | TOKEN_KEYWORD_GRAPH
         | TOKEN_KEYWORD_NODE
         | TOKEN_KEYWORD_EDGE
         | TOKEN_KEYWORD_SUBGRAPH
         | TOKEN_LEFT_BRACE
   );

   /// Tokens that reliably resume a production after a parse error: the
   /// closing of every bracketed construct, statement separators, and
   /// anything that can start a fresh graph/statement.
   pub const RECOVERY: EnumSet<Kind> = enum_set!(
      TOKEN_RIGHT_BRACE
         | TOKEN_SEMICOLON
         | TOKEN_KEYWORD_STRICT
         | TOKEN_KEYWORD_GRAPH
         | TOKEN_KEYWORD_DIGRAPH
         | TOKEN_LEFT_BRACKET
         | TOKEN_RIGHT_BRACKET
         | TOKEN_KEYWORD_NODE
         | TOKEN_KEYWORD_EDGE
   );

   /// Case-insensitive keyword lookup: folds `s` to lowercase and matches
   /// against the fixed keyword table.
   #[must_use]
   pub fn keyword(s: &str) -> Option<Kind> {
      Some(match s.to_ascii_lowercase().as_str() {
         "graph" => TOKEN_KEYWORD_GRAPH,
         "digraph" => TOKEN_KEYWORD_DIGRAPH,
         "subgraph" => TOKEN_KEYWORD_SUBGRAPH,
         "strict" => TOKEN_KEYWORD_STRICT,
         "node" => TOKEN_KEYWORD_NODE,
         "edge" => TOKEN_KEYWORD_EDGE,
         _ => return None,
      })
   }

   /// Whether this token kind should be skipped by the parser's direct
   /// lookahead (but buffered for comment-placement purposes).
   #[must_use]
   pub fn is_trivia(self) -> bool {
      Self::TRIVIA.contains(self)
   }

   #[must_use]
   pub fn is_error(self) -> bool {
      matches!(self, TOKEN_ERROR)
   }

   /// The name used in diagnostics and the `inspect tokens` `TYPE` column.
   #[must_use]
   pub fn name(self) -> &'static str {
      match self {
         TOKEN_LEFT_BRACE => "'{'",
         TOKEN_RIGHT_BRACE => "'}'",
         TOKEN_LEFT_BRACKET => "'['",
         TOKEN_RIGHT_BRACKET => "']'",
         TOKEN_COLON => "':'",
         TOKEN_COMMA => "','",
         TOKEN_SEMICOLON => "';'",
         TOKEN_EQUAL => "'='",
         TOKEN_UNDIRECTED_EDGE => "'--'",
         TOKEN_DIRECTED_EDGE => "'->'",
         TOKEN_KEYWORD_GRAPH => "'graph'",
         TOKEN_KEYWORD_DIGRAPH => "'digraph'",
         TOKEN_KEYWORD_SUBGRAPH => "'subgraph'",
         TOKEN_KEYWORD_STRICT => "'strict'",
         TOKEN_KEYWORD_NODE => "'node'",
         TOKEN_KEYWORD_EDGE => "'edge'",
         TOKEN_ID => "ID",
         TOKEN_COMMENT => "comment",
         TOKEN_ERROR => "ERROR",
         TOKEN_EOF => "end of file",
         FILE => "File",
         GRAPH => "Graph",
         SUBGRAPH => "Subgraph",
         STMT_LIST => "StmtList",
         NODE_STMT => "NodeStmt",
         EDGE_STMT => "EdgeStmt",
         ATTR_STMT => "AttrStmt",
         NODE_ID => "NodeID",
         PORT => "Port",
         COMPASS_POINT => "CompassPoint",
         ATTR_LIST => "AttrList",
         A_LIST => "AList",
         ATTRIBUTE => "Attribute",
         ATTR_NAME => "AttrName",
         ATTR_VALUE => "AttrValue",
         ID => "ID",
         ERROR_TREE => "ErrorTree",
      }
   }
}

impl std::fmt::Display for Kind {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.write_str(self.name())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn keyword_lookup_is_case_insensitive() {
      assert_eq!(Kind::keyword("DiGraph"), Some(TOKEN_KEYWORD_DIGRAPH));
      assert_eq!(Kind::keyword("STRICT"), Some(TOKEN_KEYWORD_STRICT));
      assert_eq!(Kind::keyword("notakeyword"), None);
   }

   #[test]
   fn recovery_set_excludes_ordinary_ids() {
      assert!(!Kind::RECOVERY.contains(TOKEN_ID));
      assert!(Kind::RECOVERY.contains(TOKEN_RIGHT_BRACE));
   }
}
