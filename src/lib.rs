//! MiniJava: a compiler and stack machine for a small Java subset.
//!
//! The pipeline lives in the workspace crates:
//! - `minijava-core`: spans, errors and the diagnostic collector
//! - `minijava-parser`: lexer, AST and parser
//! - `minijava-compiler`: identification, type checking and code generation
//!
//! This crate ties them together with [`Unit`] and executes the generated
//! [`Program`] on the [`Vm`].

pub mod unit;
pub mod vm;

pub use unit::{BuildError, ExecutionError, Unit, UnitError, UnitOptions};
pub use vm::{ExecutionStats, Vm, VmConfig};

pub use minijava_compiler::{CompilationResult, Compiler, Program, Stage};
pub use minijava_core::{
    CompilationError, Diagnostics, ErrorCategory, MiniJavaError, ParseError, ParseErrors,
    RuntimeError, Span,
};
pub use minijava_parser::{Package, Parser};
