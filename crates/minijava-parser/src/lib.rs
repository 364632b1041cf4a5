//! MiniJava parser crate.
//!
//! This crate provides the lexer, the AST model and the recursive-descent
//! parser for MiniJava source code:
//! - Lexical analysis (tokenization)
//! - Abstract Syntax Tree (AST) definitions, including the declaration arena
//!   and the built-in declarations
//! - Parser for transforming tokens into a [`ast::Package`]
//!
//! # Example
//!
//! ```
//! use minijava_parser::Parser;
//!
//! let source = "class Main { public static void main(String[] args) { } }";
//! let package = Parser::parse(source).expect("valid program");
//! assert_eq!(package.classes.len(), 1);
//! ```

pub mod ast;
pub mod lexer;

pub use ast::{Package, Parser};
pub use lexer::{Lexer, Token, TokenKind};
