//! JavaScript lexer and recursive-descent parser
//!
//! # Example
//!
//! ```
//! use hedwig::ast::Statement;
//! use hedwig::lexer::TokenKind;
//!
//! let tokens = hedwig::tokenize("let x = 10;");
//! assert_eq!(tokens.len(), 6);
//! assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
//!
//! let program = hedwig::parse("function add(a, b) { return a + b; }");
//! assert!(program.errors.is_empty());
//! assert!(matches!(program.body.first(), Some(Statement::FunctionDeclaration(_))));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::Program;
pub use error::{ParseError, ParseResult};
pub use lexer::{Lexer, Span, Token, TokenKind, tokenize};
pub use parser::{Parser, parse};
