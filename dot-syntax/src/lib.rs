//! Scanner, tree, parser and printer for the Graphviz DOT language.

pub use self::{
   kind::Kind,
   parser::Parser,
   printer::{
      PrintError,
      Printer,
   },
   scanner::Scanner,
   token::Token,
   tree::{
      Child,
      Format,
      Tree,
   },
};

mod kind;
mod parser;
mod printer;
mod scanner;
mod token;
mod tree;
