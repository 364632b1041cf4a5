//! Scope stack used by identification.
//!
//! Scopes are layered in tiers:
//!
//! ```text
//! level 0   class names (built-ins and user classes)
//! level 1   members of the current class (fields and methods)
//! level 2   parameters of the current method or constructor
//! level 3+  locals, one scope per block / for statement
//! ```
//!
//! Lookups run innermost first. A local may not reuse the name of a parameter
//! or of a local in an enclosing scope, but may hide a field.

use minijava_parser::ast::DeclId;
use rustc_hash::FxHashMap;

// ============================================================================
// Types
// ============================================================================

pub const CLASS_LEVEL: usize = 0;
pub const MEMBER_LEVEL: usize = 1;
pub const PARAMETER_LEVEL: usize = 2;
pub const LOCAL_LEVEL: usize = 3;

/// What kind of declaration a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Field,
    Method,
    Parameter,
    Local,
}

impl SymbolKind {
    /// Fields and methods live side by side in the member scope and may
    /// share a name; everything else shares the value namespace.
    fn namespace(self) -> Namespace {
        match self {
            SymbolKind::Method => Namespace::Method,
            _ => Namespace::Value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Namespace {
    Value,
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub decl: DeclId,
    pub kind: SymbolKind,
}

/// Why a declaration could not be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareError {
    /// The same name already exists in the current scope.
    Duplicate(Symbol),
    /// A local would hide a parameter or an enclosing local.
    Shadows(Symbol),
}

type Scope = FxHashMap<(Namespace, String), Symbol>;

// ============================================================================
// SymbolTable
// ============================================================================

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding only the (empty) class-name scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    pub fn open_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Close the innermost scope. The class-name scope is never closed.
    pub fn close_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "closing the class-name scope");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Index of the innermost scope.
    pub fn level(&self) -> usize {
        self.scopes.len() - 1
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Enter `name` into the innermost scope.
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> Result<(), DeclareError> {
        let key = (symbol.kind.namespace(), name.to_string());

        if symbol.kind == SymbolKind::Local {
            for scope in &self.scopes[PARAMETER_LEVEL.min(self.scopes.len())..] {
                if let Some(existing) = scope.get(&key) {
                    return Err(DeclareError::Shadows(*existing));
                }
            }
        }

        let level = self.level();
        let scope = &mut self.scopes[level];
        if let Some(existing) = scope.get(&key) {
            return Err(DeclareError::Duplicate(*existing));
        }
        scope.insert(key, symbol);
        Ok(())
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn lookup_class(&self, name: &str) -> Option<DeclId> {
        self.scopes[CLASS_LEVEL]
            .get(&(Namespace::Value, name.to_string()))
            .map(|symbol| symbol.decl)
    }

    /// A parameter or local, innermost first.
    pub fn lookup_variable(&self, name: &str) -> Option<DeclId> {
        let key = (Namespace::Value, name.to_string());
        self.scopes
            .iter()
            .skip(PARAMETER_LEVEL)
            .rev()
            .find_map(|scope| scope.get(&key))
            .map(|symbol| symbol.decl)
    }

    /// A field of the current class.
    pub fn lookup_field(&self, name: &str) -> Option<DeclId> {
        self.member(Namespace::Value, name)
    }

    /// A method of the current class.
    pub fn lookup_method(&self, name: &str) -> Option<DeclId> {
        self.member(Namespace::Method, name)
    }

    fn member(&self, namespace: Namespace, name: &str) -> Option<DeclId> {
        self.scopes
            .get(MEMBER_LEVEL)?
            .get(&(namespace, name.to_string()))
            .map(|symbol| symbol.decl)
    }
}
