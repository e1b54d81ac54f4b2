use itertools::Itertools as _;

use crate::width;

/// Greedily word-wraps `s` so that every produced line has scalar width
/// `<= max` where possible; a single word that alone exceeds `max` is
/// emitted on its own overlong line rather than being split mid-word.
///
/// Used by the printer for long comment bodies, which are word-wrapped
/// within `maxColumn` at word boundaries.
pub fn wrap(s: &str, max: usize) -> Vec<String> {
   let mut lines = Vec::new();
   let mut line = String::new();
   let mut line_width = 0_usize;

   for word in s.split_whitespace() {
      let word_width = width(word);
      let added_width = if line.is_empty() {
         word_width
      } else {
         word_width + 1
      };

      if !line.is_empty() && line_width + added_width > max {
         lines.push(mem_take_line(&mut line));
         line_width = 0;
      }

      if !line.is_empty() {
         line.push(' ');
         line_width += 1;
      }

      line.push_str(word);
      line_width += word_width;
   }

   if !line.is_empty() {
      lines.push(line);
   }

   lines
}

fn mem_take_line(line: &mut String) -> String {
   std::mem::take(line)
}

/// Joins `lines` back with newlines, purely a test helper for round-tripping
/// readably.
#[cfg(test)]
fn rejoin(lines: &[String]) -> String {
   lines.iter().join("\n")
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn wraps_at_word_boundaries() {
      let wrapped = wrap("the quick brown fox jumps over the lazy dog", 10);
      assert!(wrapped.iter().all(|line| width(line) <= 10));
      assert_eq!(rejoin(&wrapped).split_whitespace().count(), 9);
   }

   #[test]
   fn overlong_word_stands_alone() {
      let wrapped = wrap("a supercalifragilisticexpialidocious b", 10);
      assert_eq!(wrapped[1], "supercalifragilisticexpialidocious");
   }

   #[test]
   fn fits_on_one_line() {
      assert_eq!(wrap("short comment", 100), vec!["short comment".to_owned()]);
   }
}
