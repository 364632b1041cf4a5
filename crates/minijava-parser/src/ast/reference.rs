//! Named-access paths.
//!
//! `a.b.c` is `Qualified(Qualified(Id(a), b), c)`: each qualified node wraps
//! the chain to its left.

use minijava_core::Span;

use super::{DeclId, Identifier};

#[derive(Debug, Clone)]
pub enum Reference {
    This(ThisRef),
    Id(IdRef),
    Qualified(QualRef),
}

/// `this`, bound to the enclosing class.
#[derive(Debug, Clone)]
pub struct ThisRef {
    pub span: Span,
    pub decl: Option<DeclId>,
}

/// A bare name.
#[derive(Debug, Clone)]
pub struct IdRef {
    pub id: Identifier,
}

/// `base.id`
#[derive(Debug, Clone)]
pub struct QualRef {
    pub base: Box<Reference>,
    pub id: Identifier,
    pub span: Span,
}

impl Reference {
    pub fn this(span: Span) -> Self {
        Reference::This(ThisRef { span, decl: None })
    }

    pub fn id(id: Identifier) -> Self {
        Reference::Id(IdRef { id })
    }

    pub fn qualified(base: Reference, id: Identifier) -> Self {
        let span = base.span().merge(id.span);
        Reference::Qualified(QualRef {
            base: Box::new(base),
            id,
            span,
        })
    }

    pub fn span(&self) -> Span {
        match self {
            Reference::This(this) => this.span,
            Reference::Id(id) => id.id.span,
            Reference::Qualified(qual) => qual.span,
        }
    }

    /// The declaration this reference denotes, once bound.
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            Reference::This(this) => this.decl,
            Reference::Id(id) => id.id.decl,
            Reference::Qualified(qual) => qual.id.decl,
        }
    }

    /// The last name in the chain.
    pub fn name(&self) -> &str {
        match self {
            Reference::This(_) => "this",
            Reference::Id(id) => &id.id.name,
            Reference::Qualified(qual) => &qual.id.name,
        }
    }

    pub fn is_this(&self) -> bool {
        matches!(self, Reference::This(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_chain_nests_left() {
        let a = Reference::id(Identifier::new("a", Span::new(0, 1, 1, 1)));
        let ab = Reference::qualified(a, Identifier::new("b", Span::new(2, 3, 1, 3)));
        let abc = Reference::qualified(ab, Identifier::new("c", Span::new(4, 5, 1, 5)));

        assert_eq!(abc.name(), "c");
        assert_eq!(abc.span().start, 0);
        assert_eq!(abc.span().end, 5);
        let Reference::Qualified(outer) = &abc else {
            panic!("expected qualified reference");
        };
        assert_eq!(outer.base.name(), "b");
    }

    #[test]
    fn unbound_reference_has_no_decl() {
        let this = Reference::this(Span::default());
        assert!(this.is_this());
        assert_eq!(this.decl(), None);
    }
}
