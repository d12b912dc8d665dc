//! # Go Front End
//!
//! Tokens, the lexer, the native tree, the parser and the source printer.
//!
//! - `token` - token kinds, positions and the line index
//! - `scanner` - lexer with semicolon insertion
//! - `ast` - the structural node types and their reflection
//! - `span` - start/end rules per node type
//! - `parser` - source to native tree, with recoverable diagnostics
//! - `printer` - native tree to canonical source

pub mod ast;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod span;
pub mod token;

pub use parser::{parse_file, Parsed};
pub use printer::print_file;
pub use span::Spanned;
pub use token::{LineIndex, Pos, Token};
