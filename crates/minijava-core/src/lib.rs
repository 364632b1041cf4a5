//! Core types shared by every MiniJava crate.
//!
//! - [`Span`]: source locations
//! - [`error`]: the error hierarchy for every phase
//! - [`Diagnostics`]: the append-only error collector used by the compiler passes

pub mod diagnostics;
pub mod error;
pub mod span;

pub use diagnostics::Diagnostics;
pub use error::{
    CompilationError, ErrorCategory, LexError, MiniJavaError, ParseError, ParseErrorKind,
    ParseErrors, RuntimeError,
};
pub use span::Span;
