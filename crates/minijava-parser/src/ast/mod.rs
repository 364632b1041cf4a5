//! Abstract Syntax Tree (AST) for MiniJava.
//!
//! This module provides:
//! - AST node definitions (declarations, types, statements, expressions, references)
//! - The declaration arena with its built-in entries
//! - The recursive-descent [`Parser`]
//!
//! # Example
//!
//! ```
//! use minijava_parser::Parser;
//!
//! let source = r#"
//!     class Main {
//!         public static void main(String[] args) {
//!             System.out.println(42);
//!         }
//!     }
//! "#;
//!
//! match Parser::parse(source) {
//!     Ok(package) => println!("Parsed successfully: {} classes", package.classes.len()),
//!     Err(errors) => eprintln!("Parse errors: {}", errors),
//! }
//! ```

pub mod builtins;
pub mod decl;
pub mod expr;
pub mod ident;
pub mod ops;
pub mod reference;
pub mod stmt;
pub mod types;

mod decl_parser;
mod expr_parser;
mod parser;
mod stmt_parser;

pub use minijava_core::{ParseError, ParseErrorKind, ParseErrors};

pub use decl::*;
pub use expr::*;
pub use ident::Identifier;
pub use ops::*;
pub use parser::Parser;
pub use reference::*;
pub use stmt::*;
pub use types::*;

use minijava_core::Span;

/// Root of a parsed program.
///
/// Owns the class trees and the arena holding every declaration, built-ins
/// included.
#[derive(Debug, Clone)]
pub struct Package {
    pub classes: Vec<ClassDecl>,
    pub decls: DeclArena,
    pub span: Span,
}

impl Package {
    /// An empty package whose arena holds only the built-ins.
    pub fn new(span: Span) -> Self {
        Self {
            classes: Vec::new(),
            decls: DeclArena::with_builtins(),
            span,
        }
    }

    /// Look up a user class by name.
    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes
            .iter()
            .find(|class| self.decls[class.decl].name == name)
    }

    /// Look up a declaration of a user class member by class and member name.
    pub fn member(&self, class: &str, member: &str) -> Option<DeclId> {
        let info = self.decls[self.class(class)?.decl].class_info()?;
        info.fields
            .iter()
            .chain(info.methods.iter())
            .copied()
            .find(|&id| self.decls[id].name == member)
    }
}
