//! Type denoters.
//!
//! Types are structural: two class types are the same type only when they
//! resolve to the same class declaration, and array types compare their
//! element types recursively.

use std::fmt;

use super::{DeclId, Identifier};

/// A type as written in source or computed by the type checker.
#[derive(Debug, Clone)]
pub enum TypeDenoter {
    Void,
    Int,
    Boolean,
    /// A class type. The identifier is bound to the class declaration
    /// during identification.
    Class(ClassType),
    /// An array of the element type.
    Array(Box<TypeDenoter>),
    /// Produced after a reported error; matches any type.
    Error,
    /// A type the language cannot manipulate; matches no type.
    Unsupported,
}

/// A reference to a class by name.
#[derive(Debug, Clone)]
pub struct ClassType {
    pub name: Identifier,
}

impl ClassType {
    pub fn new(name: Identifier) -> Self {
        Self { name }
    }

    /// The class declaration this type resolves to, once bound.
    pub fn decl(&self) -> Option<DeclId> {
        self.name.decl
    }
}

impl TypeDenoter {
    /// Build a class type that is already bound to `decl`.
    pub fn class(name: impl Into<String>, decl: DeclId) -> Self {
        let mut id = Identifier::new(name, minijava_core::Span::BUILTIN);
        id.bind(decl);
        TypeDenoter::Class(ClassType::new(id))
    }

    /// Build an array of `element`.
    pub fn array(element: TypeDenoter) -> Self {
        TypeDenoter::Array(Box::new(element))
    }

    /// Structural type equivalence.
    ///
    /// `Error` matches anything, `Unsupported` matches nothing. A class type
    /// whose name failed to resolve behaves like `Error`.
    pub fn matches(&self, other: &TypeDenoter) -> bool {
        use TypeDenoter::*;
        match (self, other) {
            (Error, _) | (_, Error) => true,
            (Unsupported, _) | (_, Unsupported) => false,
            (Void, Void) | (Int, Int) | (Boolean, Boolean) => true,
            (Class(a), Class(b)) => match (a.decl(), b.decl()) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            },
            (Array(a), Array(b)) => a.matches(b),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeDenoter::Error)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeDenoter::Void)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeDenoter::Array(_))
    }

    /// Element type of an array type.
    pub fn element(&self) -> Option<&TypeDenoter> {
        match self {
            TypeDenoter::Array(element) => Some(element),
            _ => None,
        }
    }

    /// The class declaration of a bound class type.
    pub fn class_decl(&self) -> Option<DeclId> {
        match self {
            TypeDenoter::Class(class) => class.decl(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDenoter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDenoter::Void => write!(f, "void"),
            TypeDenoter::Int => write!(f, "int"),
            TypeDenoter::Boolean => write!(f, "boolean"),
            TypeDenoter::Class(class) => write!(f, "{}", class.name.name),
            TypeDenoter::Array(element) => write!(f, "{element}[]"),
            TypeDenoter::Error => write!(f, "<error>"),
            TypeDenoter::Unsupported => write!(f, "<unsupported>"),
        }
    }
}
