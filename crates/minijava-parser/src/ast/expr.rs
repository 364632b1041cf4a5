//! Expression nodes.

use minijava_core::Span;

use super::{BinaryOp, ClassType, Reference, TypeDenoter, UnaryOp};

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(LiteralExpr),
    /// A reference read as a value.
    Ref(Reference),
    /// `a[i]`
    Index(IndexExpr),
    /// `r(args)`
    Call(CallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    /// `new C(args)`
    NewObject(NewObjectExpr),
    /// `new T[n]`
    NewArray(NewArrayExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int(i32),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone)]
pub struct LiteralExpr {
    pub value: Literal,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub base: Reference,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Reference,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct NewObjectExpr {
    pub class: ClassType,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct NewArrayExpr {
    pub element: TypeDenoter,
    pub size: Box<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Ref(r) => r.span(),
            Expr::Index(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::NewObject(e) => e.span,
            Expr::NewArray(e) => e.span,
        }
    }
}
