//! Identifiers and their resolved-declaration slot.

use minijava_core::Span;

use super::DeclId;

/// A name occurrence in source.
///
/// `decl` starts empty and is filled by identification.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
    pub decl: Option<DeclId>,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            decl: None,
        }
    }

    /// Link this occurrence to its declaration.
    ///
    /// Rebinding to a different declaration indicates a re-entrant traversal bug.
    pub fn bind(&mut self, decl: DeclId) {
        debug_assert!(
            self.decl.is_none_or(|existing| existing == decl),
            "identifier '{}' rebound from {:?} to {:?}",
            self.name,
            self.decl,
            decl
        );
        self.decl = Some(decl);
    }
}
