//! Statement nodes.

use minijava_core::Span;

use super::{CallExpr, DeclId, Expr, Reference};

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(BlockStmt),
    /// `T x = e;` declaring a local.
    VarDecl(VarDeclStmt),
    /// `r = e;`
    Assign(AssignStmt),
    /// `r[i] = e;`
    IndexAssign(IndexAssignStmt),
    /// `r(args);`
    Call(CallExpr),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
}

#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarDeclStmt {
    pub decl: DeclId,
    pub init: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub target: Reference,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IndexAssignStmt {
    pub target: Reference,
    pub index: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// `for (init; cond; update) body`, each clause optional.
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub update: Option<Box<Stmt>>,
    pub body: Box<Stmt>,
    pub span: Span,
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(s) => s.span,
            Stmt::VarDecl(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::IndexAssign(s) => s.span,
            Stmt::Call(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
        }
    }

    pub fn is_var_decl(&self) -> bool {
        matches!(self, Stmt::VarDecl(_))
    }
}
