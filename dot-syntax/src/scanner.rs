use dot_span::Position;

use crate::{
   kind::Kind::{
      self,
      *,
   },
   token::Token,
};

fn is_unquoted_continue(c: char) -> bool {
   c == '_' || c.is_ascii_alphanumeric() || (c as u32) >= 0x80
}

fn is_natural_separator(c: char) -> bool {
   matches!(
      c,
      ' ' | '\t' | '\r' | '\n' | '{' | '}' | '[' | ']' | ':' | ',' | ';' | '=' | '-' | '/' | '#' | '"'
   )
}

/// Converts a byte buffer into a stream of [`Token`]s, never aborting: bad
/// input becomes `ERROR` tokens carrying a diagnostic message, and the
/// scanner keeps going. Single-threaded, synchronous, allocation-bounded
/// per token.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
   source: &'a str,
   offset: usize,
   pos: Position,
}

impl<'a> Scanner<'a> {
   #[must_use]
   pub fn new(source: &'a str) -> Self {
      Self {
         source,
         offset: 0,
         pos: Position::default(),
      }
   }

   fn remaining(&self) -> &'a str {
      &self.source[self.offset..]
   }

   fn peek_char(&self) -> Option<char> {
      self.remaining().chars().next()
   }

   fn peek_char_nth(&self, n: usize) -> Option<char> {
      self.remaining().chars().nth(n)
   }

   /// Consumes the current scalar, returning it together with the position
   /// it occupied (the position a token ending on this scalar should use).
   fn bump(&mut self) -> (char, Position) {
      let c = self.peek_char().expect("bump called at end of input");
      let at = self.pos;

      self.offset += c.len_utf8();
      self.pos = self.pos.advance(c);

      (c, at)
   }

   fn slice_from(&self, start_offset: usize) -> String {
      self.source[start_offset..self.offset].to_owned()
   }

   fn skip_whitespace(&mut self) {
      while matches!(self.peek_char(), Some(' ' | '\t' | '\r' | '\n')) {
         self.bump();
      }
   }

   fn single(&mut self, kind: Kind) -> Token {
      let start = self.pos;
      let start_offset = self.offset;
      let (_, end) = self.bump();

      Token {
         kind,
         literal: self.slice_from(start_offset),
         start,
         end,
         error: None,
      }
   }

   fn double(&mut self, kind: Kind) -> Token {
      let start = self.pos;
      let start_offset = self.offset;
      self.bump();
      let (_, end) = self.bump();

      Token {
         kind,
         literal: self.slice_from(start_offset),
         start,
         end,
         error: None,
      }
   }

   fn scan_line_comment(&mut self, marker_len: usize) -> Token {
      let start = self.pos;
      let start_offset = self.offset;
      let mut end = start;

      for _ in 0..marker_len {
         (_, end) = self.bump();
      }

      while !matches!(self.peek_char(), None | Some('\n')) {
         (_, end) = self.bump();
      }

      Token {
         kind: TOKEN_COMMENT,
         literal: self.slice_from(start_offset),
         start,
         end,
         error: None,
      }
   }

   fn scan_block_comment(&mut self) -> Token {
      let start = self.pos;
      let start_offset = self.offset;
      let mut end = start;

      (_, end) = self.bump(); // '/'
      (_, end) = self.bump(); // '*'

      let closed = loop {
         match (self.peek_char(), self.peek_char_nth(1)) {
            (Some('*'), Some('/')) => {
               (_, end) = self.bump();
               (_, end) = self.bump();
               break true;
            },
            (None, _) => break false,
            _ => {
               (_, end) = self.bump();
            },
         }
      };

      let literal = self.slice_from(start_offset);

      if closed {
         Token {
            kind: TOKEN_COMMENT,
            literal,
            start,
            end,
            error: None,
         }
      } else {
         Token {
            kind: TOKEN_ERROR,
            literal,
            start,
            end,
            error: Some("unterminated block comment".to_owned()),
         }
      }
   }

   fn scan_bad_slash(&mut self) -> Token {
      let start = self.pos;
      let start_offset = self.offset;
      let (_, end) = self.bump();

      Token {
         kind: TOKEN_ERROR,
         literal: self.slice_from(start_offset),
         start,
         end,
         error: Some("use '//' (line) or '/*...*/' (block) for comments".to_owned()),
      }
   }

   fn scan_quoted(&mut self) -> Token {
      let start = self.pos;
      let start_offset = self.offset;
      let (_, mut end) = self.bump(); // opening '"'

      let mut closed = false;
      let mut has_null = false;

      loop {
         match self.peek_char() {
            None => break,

            Some('\\') => {
               (_, end) = self.bump();
               match self.peek_char() {
                  Some(_) => (_, end) = self.bump(),
                  None => break,
               }
            },

            Some('"') => {
               (_, end) = self.bump();
               closed = true;
               break;
            },

            Some('\0') => {
               has_null = true;
               (_, end) = self.bump();
            },

            Some(_) => {
               (_, end) = self.bump();
            },
         }
      }

      let literal = self.slice_from(start_offset);

      if !closed {
         Token {
            kind: TOKEN_ERROR,
            literal,
            start,
            end,
            error: Some("unterminated quoted identifier".to_owned()),
         }
      } else if has_null {
         Token {
            kind: TOKEN_ERROR,
            literal,
            start,
            end,
            error: Some("null byte in quoted identifier".to_owned()),
         }
      } else {
         Token {
            kind: TOKEN_ID,
            literal,
            start,
            end,
            error: None,
         }
      }
   }

   fn scan_numeral(&mut self) -> Token {
      let start = self.pos;
      let start_offset = self.offset;
      let mut end = start;

      let mut digits = 0_usize;
      let mut dots = 0_usize;

      if self.peek_char() == Some('-') {
         (_, end) = self.bump();
      }

      loop {
         match self.peek_char() {
            Some(c) if c.is_ascii_digit() => {
               digits += 1;
               (_, end) = self.bump();
            },
            Some('.') => {
               dots += 1;
               (_, end) = self.bump();
            },
            _ => break,
         }
      }

      let literal = self.slice_from(start_offset);

      if digits == 0 {
         Token {
            kind: TOKEN_ERROR,
            literal,
            start,
            end,
            error: Some("malformed numeral: at least one digit is required".to_owned()),
         }
      } else if dots > 1 {
         Token {
            kind: TOKEN_ERROR,
            literal,
            start,
            end,
            error: Some("malformed numeral: multiple '.' are not allowed".to_owned()),
         }
      } else {
         Token {
            kind: TOKEN_ID,
            literal,
            start,
            end,
            error: None,
         }
      }
   }

   fn scan_unquoted_or_error(&mut self) -> Token {
      let start = self.pos;
      let start_offset = self.offset;
      let mut end = start;

      let mut first_offending: Option<char> = None;

      loop {
         match self.peek_char() {
            None => break,
            Some(c) if is_natural_separator(c) => break,
            Some(c) => {
               if first_offending.is_none() && !is_unquoted_continue(c) {
                  first_offending = Some(c);
               }
               (_, end) = self.bump();
            },
         }
      }

      let literal = self.slice_from(start_offset);

      match first_offending {
         Some(c) => Token {
            kind: TOKEN_ERROR,
            literal,
            start,
            end,
            error: Some(format!(
               "invalid character '{c}': unquoted IDs can only contain letters, digits, and underscores"
            )),
         },
         None => {
            let kind = Kind::keyword(&literal).unwrap_or(TOKEN_ID);

            Token {
               kind,
               literal,
               start,
               end,
               error: None,
            }
         },
      }
   }

   /// Returns the next token; past the end of input, returns `EOF` at the
   /// final position forever.
   pub fn next(&mut self) -> Token {
      self.skip_whitespace();

      let Some(c) = self.peek_char() else {
         return Token::eof(self.pos);
      };

      log::trace!("scanning at {:?} starting with {c:?}", self.pos);

      match c {
         '{' => self.single(TOKEN_LEFT_BRACE),
         '}' => self.single(TOKEN_RIGHT_BRACE),
         '[' => self.single(TOKEN_LEFT_BRACKET),
         ']' => self.single(TOKEN_RIGHT_BRACKET),
         ':' => self.single(TOKEN_COLON),
         ',' => self.single(TOKEN_COMMA),
         ';' => self.single(TOKEN_SEMICOLON),
         '=' => self.single(TOKEN_EQUAL),

         '-' if self.peek_char_nth(1) == Some('-') => self.double(TOKEN_UNDIRECTED_EDGE),
         '-' if self.peek_char_nth(1) == Some('>') => self.double(TOKEN_DIRECTED_EDGE),
         '-' => self.scan_numeral(),

         '#' => self.scan_line_comment(1),

         '/' if self.peek_char_nth(1) == Some('/') => self.scan_line_comment(2),
         '/' if self.peek_char_nth(1) == Some('*') => self.scan_block_comment(),
         '/' => self.scan_bad_slash(),

         '"' => self.scan_quoted(),

         c if c.is_ascii_digit() => self.scan_numeral(),

         _ => self.scan_unquoted_or_error(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn tokens(source: &str) -> Vec<Token> {
      let mut scanner = Scanner::new(source);
      let mut out = Vec::new();

      loop {
         let token = scanner.next();
         let done = token.is_eof();
         out.push(token);
         if done {
            break;
         }
      }

      out
   }

   #[test]
   fn empty_input_is_immediately_eof() {
      let toks = tokens("");
      assert_eq!(toks.len(), 1);
      assert!(toks[0].is_eof());
   }

   #[test]
   fn simple_graph_header() {
      let toks = tokens("digraph {}");
      let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
      assert_eq!(
         kinds,
         vec![TOKEN_KEYWORD_DIGRAPH, TOKEN_LEFT_BRACE, TOKEN_RIGHT_BRACE, TOKEN_EOF]
      );
   }

   #[test]
   fn keyword_promotion_is_case_insensitive() {
      let toks = tokens("DiGraph");
      assert_eq!(toks[0].kind, TOKEN_KEYWORD_DIGRAPH);
   }

   #[test]
   fn edge_operators() {
      let toks = tokens("A -- B -> C");
      let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
      assert_eq!(
         kinds,
         vec![
            TOKEN_ID,
            TOKEN_UNDIRECTED_EDGE,
            TOKEN_ID,
            TOKEN_DIRECTED_EDGE,
            TOKEN_ID,
            TOKEN_EOF
         ]
      );
   }

   #[test]
   fn invalid_character_mid_identifier_scenario() {
      let toks = tokens("digraph { a@b }");
      let error = toks.iter().find(|t| t.kind == TOKEN_ERROR).unwrap();
      assert_eq!(error.literal, "a@b");
      assert_eq!(error.start, Position::new(1, 11));
      assert_eq!(
         error.error.as_deref(),
         Some("invalid character '@': unquoted IDs can only contain letters, digits, and underscores")
      );
   }

   #[test]
   fn line_comment_excludes_newline() {
      let toks = tokens("// hello\nA");
      assert_eq!(toks[0].kind, TOKEN_COMMENT);
      assert_eq!(toks[0].literal, "// hello");
   }

   #[test]
   fn hash_comment_is_line_comment() {
      let toks = tokens("# hello\nA");
      assert_eq!(toks[0].kind, TOKEN_COMMENT);
      assert_eq!(toks[0].literal, "# hello");
   }

   #[test]
   fn block_comment_spans_lines() {
      let toks = tokens("/* a\nb */A");
      assert_eq!(toks[0].kind, TOKEN_COMMENT);
      assert_eq!(toks[0].literal, "/* a\nb */");
      assert_eq!(toks[0].end, Position::new(2, 4));
   }

   #[test]
   fn unterminated_block_comment_is_error_to_eof() {
      let toks = tokens("/* never closes");
      assert_eq!(toks[0].kind, TOKEN_ERROR);
      assert_eq!(toks[0].error.as_deref(), Some("unterminated block comment"));
   }

   #[test]
   fn bad_slash_is_error() {
      let toks = tokens("/ A");
      assert_eq!(toks[0].kind, TOKEN_ERROR);
      assert_eq!(toks[0].literal, "/");
   }

   #[test]
   fn quoted_identifier_with_escape() {
      let toks = tokens(r#""foo \" bar""#);
      assert_eq!(toks[0].kind, TOKEN_ID);
      assert_eq!(toks[0].literal, r#""foo \" bar""#);
   }

   #[test]
   fn unterminated_quoted_identifier() {
      let toks = tokens(r#""foo"#);
      assert_eq!(toks[0].kind, TOKEN_ERROR);
      assert_eq!(toks[0].error.as_deref(), Some("unterminated quoted identifier"));
   }

   #[test]
   fn numeral_forms() {
      assert_eq!(tokens("123")[0].kind, TOKEN_ID);
      assert_eq!(tokens("-123")[0].kind, TOKEN_ID);
      assert_eq!(tokens("1.5")[0].kind, TOKEN_ID);
   }

   #[test]
   fn numeral_missing_digits_is_error() {
      let toks = tokens("- ");
      assert_eq!(toks[0].kind, TOKEN_ERROR);
      assert_eq!(
         toks[0].error.as_deref(),
         Some("malformed numeral: at least one digit is required")
      );
   }

   #[test]
   fn numeral_multiple_dots_is_error() {
      let toks = tokens("1.2.3");
      assert_eq!(toks[0].kind, TOKEN_ERROR);
      assert_eq!(
         toks[0].error.as_deref(),
         Some("malformed numeral: multiple '.' are not allowed")
      );
   }

   #[test]
   fn eof_is_stable_and_repeatable() {
      let mut scanner = Scanner::new("A");
      scanner.next();
      let first_eof = scanner.next();
      let second_eof = scanner.next();
      assert_eq!(first_eof, second_eof);
   }

   #[test]
   fn token_coverage_reproduces_source() {
      let source = "digraph { a -> b [color=red] // trailing\n}";
      let mut scanner = Scanner::new(source);
      let mut rebuilt = String::new();
      let mut prev_end_offset = 0_usize;
      let mut offset = 0_usize;

      loop {
         let token = scanner.next();
         if token.is_eof() {
            break;
         }

         let token_start_offset = source[offset..].find(&token.literal).map_or(offset, |i| offset + i);
         rebuilt.push_str(&source[prev_end_offset..token_start_offset]);
         rebuilt.push_str(&token.literal);

         offset = token_start_offset + token.literal.len();
         prev_end_offset = offset;
      }

      rebuilt.push_str(&source[prev_end_offset..]);
      assert_eq!(rebuilt, source);
   }
}
