//! Input boundary: lexing and command classification for the view-DDL dialect.
//!
//! The semantic layer consumes an ordered [`CommandSeq`] per file; this
//! module produces it. Tokenization is logos-based, segmentation is
//! clause-driven, and every command is classified exactly once into a
//! [`CommandKind`] variant.

pub mod command;
pub mod lexer;
pub mod token;

pub use command::{Command, CommandKind, CommandSeq, parse_source};
pub use lexer::tokenize;
pub use token::{Token, TokenKind};
