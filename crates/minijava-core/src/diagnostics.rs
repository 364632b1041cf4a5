//! Append-only diagnostic collector shared by the compiler passes.
//!
//! Passes never abort on a recoverable error: they report into a
//! [`Diagnostics`] and keep going. The pipeline driver checks
//! [`Diagnostics::has_errors`] between stages.

use std::fmt;

use log::debug;

use crate::{CompilationError, Span};

/// Collects compilation errors in report order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<CompilationError>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn report(&mut self, error: CompilationError) {
        debug!("diagnostic: {error}");
        self.errors.push(error);
    }

    /// Record a free-form message.
    pub fn report_message(&mut self, message: impl Into<String>, span: Span) {
        self.report(CompilationError::Other {
            message: message.into(),
            span,
        });
    }

    /// Whether any error has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Recorded errors in report order.
    pub fn errors(&self) -> &[CompilationError] {
        &self.errors
    }

    /// Iterate over recorded errors.
    pub fn iter(&self) -> std::slice::Iter<'_, CompilationError> {
        self.errors.iter()
    }

    /// Consume the collector, returning its errors.
    pub fn into_errors(self) -> Vec<CompilationError> {
        self.errors
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a CompilationError;
    type IntoIter = std::slice::Iter<'a, CompilationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "*** {error}")?;
        }
        Ok(())
    }
}
