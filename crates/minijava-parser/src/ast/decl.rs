//! Declarations.
//!
//! Every declaration (class, field, method, constructor, parameter, local and
//! the synthetic array length) lives in the [`DeclArena`] owned by the
//! package and is addressed by [`DeclId`]. Tree nodes that own bodies
//! ([`ClassDecl`], [`FieldDecl`], [`MethodDecl`], [`ConstructorDecl`]) hold the
//! id of their arena entry.

use std::ops::{Index, IndexMut};

use bitflags::bitflags;
use minijava_core::Span;

use super::{Expr, Stmt, TypeDenoter};

/// Index of a declaration in the [`DeclArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Member modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const PRIVATE = 1 << 0;
        const STATIC = 1 << 1;
    }
}

// ============================================================================
// Arena entries
// ============================================================================

/// A named, typed entity.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    /// Declared type. For methods this is the return type, for classes and
    /// constructors the class type itself.
    pub ty: TypeDenoter,
    pub span: Span,
    pub kind: DeclKind,
    /// Storage offset, filled by code generation. Its meaning depends on the
    /// kind: field index, static segment slot, frame offset or code address.
    offset: Option<i32>,
}

/// What kind of declaration an arena entry is.
#[derive(Debug, Clone)]
pub enum DeclKind {
    Class(ClassInfo),
    Field(MemberInfo),
    Method(MethodInfo),
    Constructor(ConstructorInfo),
    Parameter,
    Local,
    /// The pseudo-field `.length` of an array, synthesized by identification.
    ArrayLength,
}

/// Member tables of a class.
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub fields: Vec<DeclId>,
    pub methods: Vec<DeclId>,
    /// Explicit or synthesized constructor. Always set once parsing finishes.
    pub constructor: Option<DeclId>,
}

#[derive(Debug, Clone, Copy)]
pub struct MemberInfo {
    pub modifiers: Modifiers,
    pub class: DeclId,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub modifiers: Modifiers,
    pub class: DeclId,
    pub params: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub struct ConstructorInfo {
    pub class: DeclId,
    pub params: Vec<DeclId>,
    /// True for the empty, argument-less constructor given to classes that
    /// do not declare one.
    pub synthesized: bool,
}

impl Declaration {
    pub fn new(name: impl Into<String>, ty: TypeDenoter, span: Span, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            ty,
            span,
            kind,
            offset: None,
        }
    }

    pub fn offset(&self) -> Option<i32> {
        self.offset
    }

    /// Record the storage offset.
    ///
    /// An offset may be written again only with the same value.
    pub fn set_offset(&mut self, offset: i32) {
        debug_assert!(
            self.offset.is_none_or(|existing| existing == offset),
            "offset of '{}' overwritten: {:?} -> {}",
            self.name,
            self.offset,
            offset
        );
        self.offset = Some(offset);
    }

    pub fn modifiers(&self) -> Modifiers {
        match &self.kind {
            DeclKind::Field(info) => info.modifiers,
            DeclKind::Method(info) => info.modifiers,
            _ => Modifiers::empty(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers().contains(Modifiers::STATIC)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers().contains(Modifiers::PRIVATE)
    }

    /// The class a member belongs to.
    pub fn owner(&self) -> Option<DeclId> {
        match &self.kind {
            DeclKind::Field(info) => Some(info.class),
            DeclKind::Method(info) => Some(info.class),
            DeclKind::Constructor(info) => Some(info.class),
            _ => None,
        }
    }

    /// Parameters of a method or constructor.
    pub fn params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Method(info) => &info.params,
            DeclKind::Constructor(info) => &info.params,
            _ => &[],
        }
    }

    pub fn class_info(&self) -> Option<&ClassInfo> {
        match &self.kind {
            DeclKind::Class(info) => Some(info),
            _ => None,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclKind::Class(_))
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, DeclKind::Field(_))
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, DeclKind::Method(_))
    }

    /// Parameters and locals live in a call frame.
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, DeclKind::Parameter | DeclKind::Local)
    }

    pub fn is_synthesized_constructor(&self) -> bool {
        matches!(&self.kind, DeclKind::Constructor(info) if info.synthesized)
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Owner of every declaration in a package.
#[derive(Debug, Clone, Default)]
pub struct DeclArena {
    decls: Vec<Declaration>,
}

impl DeclArena {
    /// An empty arena without built-ins.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.index())
    }

    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.decls.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, decl)| (DeclId(i as u32), decl))
    }

    /// Mutable access to the class member tables.
    pub fn class_info_mut(&mut self, id: DeclId) -> Option<&mut ClassInfo> {
        match &mut self.get_mut(id)?.kind {
            DeclKind::Class(info) => Some(info),
            _ => None,
        }
    }
}

impl Index<DeclId> for DeclArena {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }
}

impl IndexMut<DeclId> for DeclArena {
    fn index_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.decls[id.index()]
    }
}

// ============================================================================
// Tree nodes
// ============================================================================

/// A class and the bodies of its members, in source order.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub decl: DeclId,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// The explicit constructor, if the class declares one.
    pub constructor: Option<ConstructorDecl>,
    pub span: Span,
}

/// A field and its optional initializer.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub decl: DeclId,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub decl: DeclId,
    pub params: Vec<ParameterDecl>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    pub decl: DeclId,
    pub params: Vec<ParameterDecl>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterDecl {
    pub decl: DeclId,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(name: &str) -> Declaration {
        Declaration::new(name, TypeDenoter::Int, Span::default(), DeclKind::Local)
    }

    #[test]
    fn alloc_assigns_sequential_ids() {
        let mut arena = DeclArena::empty();
        let a = arena.alloc(local("a"));
        let b = arena.alloc(local("b"));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena[b].name, "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn offset_slot_starts_empty() {
        let mut decl = local("x");
        assert_eq!(decl.offset(), None);
        decl.set_offset(3);
        decl.set_offset(3);
        assert_eq!(decl.offset(), Some(3));
    }

    #[test]
    #[should_panic(expected = "overwritten")]
    #[cfg(debug_assertions)]
    fn offset_overwrite_is_caught() {
        let mut decl = local("x");
        decl.set_offset(3);
        decl.set_offset(4);
    }

    #[test]
    fn member_modifiers() {
        let field = Declaration::new(
            "count",
            TypeDenoter::Int,
            Span::default(),
            DeclKind::Field(MemberInfo {
                modifiers: Modifiers::STATIC | Modifiers::PRIVATE,
                class: DeclId::from_raw(0),
            }),
        );
        assert!(field.is_static());
        assert!(field.is_private());
        assert_eq!(field.owner(), Some(DeclId::from_raw(0)));
        assert!(!local("x").is_static());
    }
}
