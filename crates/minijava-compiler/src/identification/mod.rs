//! Identification - bind every name occurrence to its declaration.
//!
//! One depth-first traversal over the package. Ambient state is a
//! [`SymbolTable`] (scopes pushed and popped in pairs around classes,
//! parameter lists, bodies, blocks and `for` statements) plus a
//! [`ResolutionContext`] describing where we are and what the left side of
//! the current reference chain produced.
//!
//! ## Responsibilities
//!
//! - Register built-in and user classes, then each class's members
//! - Resolve class names inside types
//! - Bind references (see `reference.rs` for chain rules)
//! - Synthesize `ArrayLength` declarations for `.length`
//! - Enforce static/instance context, visibility and `this` rules
//! - Check that exactly one `main` method exists
//!
//! Every error is reported and traversal continues.

mod reference;

use log::debug;
use minijava_core::{CompilationError, Diagnostics, Span};
use minijava_parser::ast::{
    builtins, ClassDecl, ClassType, ConstructorDecl, DeclArena, DeclId, Expr, FieldDecl,
    MethodDecl, Package, ParameterDecl, Stmt, TypeDenoter,
};

use crate::scope::{DeclareError, Symbol, SymbolKind, SymbolTable};

// ============================================================================
// Context
// ============================================================================

/// The member whose body or initializer is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CurrentMember {
    Method { is_static: bool },
    Constructor,
    Field { is_static: bool },
}

/// State produced by the left side of a reference chain, consumed by the
/// next segment.
#[derive(Debug, Clone, Copy, Default)]
struct ChainState {
    /// Class whose members the next segment is looked up in.
    external: Option<DeclId>,
    /// The chain has passed through an object, not just a class name.
    instance_ensured: bool,
    /// The last segment had array type, so `.length` is allowed next.
    last_was_array: bool,
    /// The last segment's type was already reported as broken; later
    /// segments fail without another error.
    poisoned: bool,
}

#[derive(Debug, Default)]
struct ResolutionContext {
    class: Option<DeclId>,
    member: Option<CurrentMember>,
    chain: ChainState,
    /// Name whose initializer is being resolved.
    declaring: Option<String>,
}

impl ResolutionContext {
    fn is_static(&self) -> bool {
        matches!(
            self.member,
            Some(CurrentMember::Method { is_static: true })
                | Some(CurrentMember::Field { is_static: true })
        )
    }
}

// ============================================================================
// Pass
// ============================================================================

/// The identification pass.
pub struct Identification<'a> {
    decls: &'a mut DeclArena,
    diagnostics: &'a mut Diagnostics,
    table: SymbolTable,
    ctx: ResolutionContext,
    mains: Vec<(DeclId, Span)>,
}

impl<'a> Identification<'a> {
    /// Bind every identifier in `package`, reporting into `diagnostics`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(package: &mut Package, diagnostics: &mut Diagnostics) {
        let Package { classes, decls, .. } = package;
        let mut pass = Identification {
            decls,
            diagnostics,
            table: SymbolTable::new(),
            ctx: ResolutionContext::default(),
            mains: Vec::new(),
        };
        pass.visit_package(classes);
    }

    fn report(&mut self, error: CompilationError) {
        self.diagnostics.report(error);
    }

    fn declare(&mut self, name: &str, decl: DeclId, kind: SymbolKind, span: Span) {
        match self.table.declare(name, Symbol { decl, kind }) {
            Ok(()) => {}
            Err(DeclareError::Duplicate(_)) if kind != SymbolKind::Local => {
                let what = match kind {
                    SymbolKind::Class => "class",
                    SymbolKind::Field | SymbolKind::Method => "member",
                    _ => "parameter",
                };
                self.report(CompilationError::Duplicate {
                    what,
                    name: name.to_string(),
                    span,
                });
            }
            Err(_) => self.report(CompilationError::IllegalShadowing {
                name: name.to_string(),
                span,
            }),
        }
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn visit_package(&mut self, classes: &mut [ClassDecl]) {
        for id in builtins::CLASSES {
            let name = self.decls[id].name.clone();
            self.declare(&name, id, SymbolKind::Class, Span::BUILTIN);
        }
        for class in classes.iter() {
            let (name, span) = (self.decls[class.decl].name.clone(), self.decls[class.decl].span);
            self.declare(&name, class.decl, SymbolKind::Class, span);
        }

        for class in classes.iter() {
            self.resolve_signatures(class);
        }
        for class in classes.iter_mut() {
            self.visit_class(class);
        }

        match self.mains.as_slice() {
            [] => self.report(CompilationError::MissingMain),
            [_] => {}
            [_, rest @ ..] => {
                let spans: Vec<Span> = rest.iter().map(|(_, span)| *span).collect();
                for span in spans {
                    self.report(CompilationError::DuplicateMain { span });
                }
            }
        }
    }

    fn visit_class(&mut self, class: &mut ClassDecl) {
        debug!("identification: class '{}'", self.decls[class.decl].name);
        self.ctx.class = Some(class.decl);
        self.table.open_scope();

        for field in &class.fields {
            let decl = &self.decls[field.decl];
            let (name, span) = (decl.name.clone(), decl.span);
            self.declare(&name, field.decl, SymbolKind::Field, span);
        }
        for method in &class.methods {
            let decl = &self.decls[method.decl];
            let (name, span) = (decl.name.clone(), decl.span);
            self.declare(&name, method.decl, SymbolKind::Method, span);
        }

        for field in &mut class.fields {
            self.visit_field(field);
        }
        for method in &mut class.methods {
            self.visit_method(method);
        }
        if let Some(ctor) = &mut class.constructor {
            self.visit_constructor(ctor);
        }

        self.table.close_scope();
        self.ctx.class = None;
    }

    fn visit_field(&mut self, field: &mut FieldDecl) {
        let Some(init) = &mut field.initializer else {
            return;
        };

        let decl = &self.decls[field.decl];
        let (name, is_static) = (decl.name.clone(), decl.is_static());
        if !is_static {
            self.report(CompilationError::InstanceFieldInitializer {
                name,
                span: field.span,
            });
            return;
        }

        self.ctx.member = Some(CurrentMember::Field { is_static });
        self.ctx.declaring = Some(name);
        self.visit_expr(init);
        self.ctx.declaring = None;
        self.ctx.member = None;
    }

    fn visit_method(&mut self, method: &mut MethodDecl) {
        let is_static = self.decls[method.decl].is_static();
        self.ctx.member = Some(CurrentMember::Method { is_static });

        self.visit_callable(&method.params, &mut method.body);

        if is_main_method(self.decls, method.decl) {
            self.mains.push((method.decl, self.decls[method.decl].span));
        }
        self.ctx.member = None;
    }

    fn visit_constructor(&mut self, ctor: &mut ConstructorDecl) {
        self.ctx.member = Some(CurrentMember::Constructor);
        self.visit_callable(&ctor.params, &mut ctor.body);
        self.ctx.member = None;
    }

    /// Parameters in their own scope, then the body in a nested one.
    fn visit_callable(&mut self, params: &[ParameterDecl], body: &mut [Stmt]) {
        self.table.open_scope();
        for param in params {
            let name = self.decls[param.decl].name.clone();
            self.declare(&name, param.decl, SymbolKind::Parameter, param.span);
        }

        self.table.open_scope();
        for stmt in body {
            self.visit_stmt(stmt);
        }
        self.table.close_scope();
        self.table.close_scope();
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Resolve the declared types of a class's fields, methods and
    /// parameters. Runs for every class before any body is visited, so a
    /// chain can pass through a class declared further down.
    fn resolve_signatures(&mut self, class: &ClassDecl) {
        for field in &class.fields {
            self.resolve_decl_type(field.decl);
        }
        for method in &class.methods {
            self.resolve_decl_type(method.decl);
            for param in &method.params {
                self.resolve_decl_type(param.decl);
            }
        }
        if let Some(ctor) = &class.constructor {
            for param in &ctor.params {
                self.resolve_decl_type(param.decl);
            }
        }
    }

    /// Resolve class names inside the declared type of an arena entry.
    fn resolve_decl_type(&mut self, id: DeclId) {
        let mut ty = std::mem::replace(&mut self.decls[id].ty, TypeDenoter::Error);
        self.resolve_type(&mut ty);
        self.decls[id].ty = ty;
    }

    fn resolve_type(&mut self, ty: &mut TypeDenoter) {
        match ty {
            TypeDenoter::Class(class) => self.resolve_class_type(class),
            TypeDenoter::Array(element) => self.resolve_type(element),
            _ => {}
        }
    }

    fn resolve_class_type(&mut self, class: &mut ClassType) {
        match self.table.lookup_class(&class.name.name) {
            Some(id) => class.name.bind(id),
            None => self.report(CompilationError::UndefinedClass {
                name: class.name.name.clone(),
                span: class.name.span,
            }),
        }
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Block(block) => {
                self.table.open_scope();
                for stmt in &mut block.stmts {
                    self.visit_stmt(stmt);
                }
                self.table.close_scope();
            }
            Stmt::VarDecl(var) => {
                self.resolve_decl_type(var.decl);
                let decl = &self.decls[var.decl];
                let (name, span) = (decl.name.clone(), decl.span);
                self.declare(&name, var.decl, SymbolKind::Local, span);

                self.ctx.declaring = Some(name);
                self.visit_expr(&mut var.init);
                self.ctx.declaring = None;
            }
            Stmt::Assign(assign) => {
                self.resolve(&mut assign.target, RefUse::Assign);
                self.visit_expr(&mut assign.value);
            }
            Stmt::IndexAssign(assign) => {
                self.resolve(&mut assign.target, RefUse::IndexAssign);
                self.visit_expr(&mut assign.index);
                self.visit_expr(&mut assign.value);
            }
            Stmt::Call(call) => {
                for arg in &mut call.args {
                    self.visit_expr(arg);
                }
                self.resolve(&mut call.callee, RefUse::Call);
            }
            Stmt::Return(ret) => {
                if let Some(value) = &mut ret.value {
                    self.visit_expr(value);
                }
            }
            Stmt::If(if_stmt) => {
                self.visit_expr(&mut if_stmt.cond);
                self.visit_branch(&mut if_stmt.then_branch);
                if let Some(else_branch) = &mut if_stmt.else_branch {
                    self.visit_branch(else_branch);
                }
            }
            Stmt::While(while_stmt) => {
                self.visit_expr(&mut while_stmt.cond);
                self.visit_branch(&mut while_stmt.body);
            }
            Stmt::For(for_stmt) => {
                self.table.open_scope();
                if let Some(init) = &mut for_stmt.init {
                    if !is_simple(init) {
                        self.report(CompilationError::InvalidForClause {
                            clause: "init",
                            span: init.span(),
                        });
                    }
                    self.visit_stmt(init);
                }
                if let Some(cond) = &mut for_stmt.cond {
                    self.visit_expr(cond);
                }
                if let Some(update) = &mut for_stmt.update {
                    if !is_simple(update) || update.is_var_decl() {
                        self.report(CompilationError::InvalidForClause {
                            clause: "update",
                            span: update.span(),
                        });
                    }
                    self.visit_stmt(update);
                }
                self.visit_branch(&mut for_stmt.body);
                self.table.close_scope();
            }
        }
    }

    /// The body of `if`/`while`/`for`. A bare declaration there is rejected.
    fn visit_branch(&mut self, stmt: &mut Stmt) {
        if stmt.is_var_decl() {
            self.report(CompilationError::ConditionalDeclaration { span: stmt.span() });
            self.table.open_scope();
            self.visit_stmt(stmt);
            self.table.close_scope();
        } else {
            self.visit_stmt(stmt);
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn visit_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Ref(reference) => {
                self.resolve(reference, RefUse::Value);
            }
            Expr::Index(index) => {
                self.resolve(&mut index.base, RefUse::Index);
                self.visit_expr(&mut index.index);
            }
            Expr::Call(call) => {
                for arg in &mut call.args {
                    self.visit_expr(arg);
                }
                self.resolve(&mut call.callee, RefUse::Call);
            }
            Expr::Unary(unary) => self.visit_expr(&mut unary.operand),
            Expr::Binary(binary) => {
                self.visit_expr(&mut binary.left);
                self.visit_expr(&mut binary.right);
            }
            Expr::NewObject(new) => {
                self.resolve_class_type(&mut new.class);
                for arg in &mut new.args {
                    self.visit_expr(arg);
                }
            }
            Expr::NewArray(new) => {
                self.resolve_type(&mut new.element);
                self.visit_expr(&mut new.size);
            }
        }
    }
}

/// How a reference is being used, which decides what it may resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefUse {
    /// Read as a value.
    Value,
    /// Left side of a longer chain.
    Qualifier,
    /// Callee of a call.
    Call,
    /// Target of `r = e`.
    Assign,
    /// Base of `r[i]`.
    Index,
    /// Target of `r[i] = e`.
    IndexAssign,
}

/// Statements allowed in a `for` clause.
fn is_simple(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::VarDecl(_) | Stmt::Assign(_) | Stmt::IndexAssign(_) | Stmt::Call(_)
    )
}

/// Whether `id` has the program entry shape:
/// `public static void main(String[] args)`.
pub fn is_main_method(decls: &DeclArena, id: DeclId) -> bool {
    let decl = &decls[id];
    if !decl.is_method() || decl.name != "main" || decl.is_private() || !decl.is_static() {
        return false;
    }
    if !decl.ty.is_void() {
        return false;
    }
    match decl.params() {
        [param] => match &decls[*param].ty {
            TypeDenoter::Array(element) => {
                matches!(&**element, TypeDenoter::Class(class) if class.name.name == "String")
            }
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijava_core::ErrorCategory;
    use minijava_parser::ast::{DeclKind, Parser, Reference};

    fn identify(source: &str) -> (Package, Diagnostics) {
        let mut package =
            Parser::parse(source).unwrap_or_else(|errors| panic!("parse failed: {errors}"));
        let mut diagnostics = Diagnostics::new();
        Identification::run(&mut package, &mut diagnostics);
        (package, diagnostics)
    }

    fn with_main(body: &str) -> String {
        format!("class Main {{ public static void main(String[] args) {{ }} }} {body}")
    }

    fn assert_clean(source: &str) -> Package {
        let (package, diagnostics) = identify(source);
        assert!(!diagnostics.has_errors(), "unexpected errors:\n{diagnostics}");
        package
    }

    fn errors(source: &str) -> Vec<CompilationError> {
        identify(source).1.into_errors()
    }

    #[test]
    fn locals_bind_to_their_declarations() {
        let package = assert_clean(
            "class Main {
                public static void main(String[] args) {
                    int x = 3;
                    int y = x + 1;
                    System.out.println(y);
                }
            }",
        );
        let main = &package.classes[0].methods[0];
        let Stmt::VarDecl(x) = &main.body[0] else {
            panic!("expected declaration");
        };
        let Stmt::VarDecl(y) = &main.body[1] else {
            panic!("expected declaration");
        };
        let Expr::Binary(sum) = &y.init else {
            panic!("expected binary");
        };
        let Expr::Ref(reference) = &*sum.left else {
            panic!("expected reference");
        };
        assert_eq!(reference.decl(), Some(x.decl));
    }

    #[test]
    fn println_chain_binds_builtins() {
        let package = assert_clean(
            "class Main { public static void main(String[] args) { System.out.println(1); } }",
        );
        let Stmt::Call(call) = &package.classes[0].methods[0].body[0] else {
            panic!("expected call");
        };
        assert_eq!(call.callee.decl(), Some(builtins::PRINTLN));
        let Reference::Qualified(println) = &call.callee else {
            panic!("expected qualified callee");
        };
        assert_eq!(println.base.decl(), Some(builtins::SYSTEM_OUT));
    }

    #[test]
    fn duplicate_method_is_reported() {
        let errors = errors(&with_main("class A { void foo() { } void foo() { } }"));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::Duplicate { what: "member", name, .. }] if name == "foo"
        ));
    }

    #[test]
    fn field_and_method_may_share_a_name() {
        assert_clean(&with_main("class A { int foo; int foo() { return foo; } }"));
    }

    #[test]
    fn duplicate_class_is_reported() {
        let errors = errors(&with_main("class A { } class A { }"));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::Duplicate { what: "class", .. }]
        ));
    }

    #[test]
    fn local_may_not_shadow_parameter_or_outer_local() {
        let errors = errors(&with_main(
            "class A {
                void f(int p) { int p = 1; }
                void g() { int x = 1; { int x = 2; } }
            }",
        ));
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .all(|e| matches!(e, CompilationError::IllegalShadowing { .. }))
        );
    }

    #[test]
    fn local_may_hide_field() {
        assert_clean(&with_main("class A { int x; void f() { int x = 1; x = 2; } }"));
    }

    #[test]
    fn sibling_blocks_reuse_names() {
        assert_clean(&with_main(
            "class A { void f() { { int x = 1; } { int x = 2; } } }",
        ));
    }

    #[test]
    fn self_reference_in_initializer() {
        let errors = errors(&with_main("class A { void f() { int x = x + 1; } }"));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::SelfReference { name, .. }] if name == "x"
        ));
    }

    #[test]
    fn undefined_names_and_classes() {
        let errors = errors(&with_main(
            "class A { B b; void f() { int x = y; q(); } }",
        ));
        assert!(matches!(errors[0], CompilationError::UndefinedClass { .. }));
        assert!(matches!(errors[1], CompilationError::UndefinedName { .. }));
        assert!(matches!(errors[2], CompilationError::UndefinedMethod { .. }));
    }

    #[test]
    fn class_name_alone_is_not_a_value() {
        let errors = errors(&with_main("class A { void f() { A a = A; } }"));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::UndefinedName { .. }]
        ));
    }

    #[test]
    fn static_context_rejects_instance_members_and_this() {
        let errors = errors(&with_main(
            "class A {
                int n;
                void g() { }
                static void f() { int x = n; g(); A a = this; }
            }",
        ));
        assert!(matches!(
            errors[0],
            CompilationError::InstanceInStaticContext { what: "field", .. }
        ));
        assert!(matches!(
            errors[1],
            CompilationError::InstanceInStaticContext { what: "method", .. }
        ));
        assert!(matches!(errors[2], CompilationError::ThisInStaticContext { .. }));
    }

    #[test]
    fn instance_member_through_class_name() {
        let errors = errors(&with_main(
            "class A {
                int n;
                static int s;
                void g() { }
                void f() { int x = A.n; A.g(); int y = A.s; }
            }",
        ));
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0],
            CompilationError::InstanceThroughClass { what: "field", .. }
        ));
        assert!(matches!(
            errors[1],
            CompilationError::InstanceThroughClass { what: "method", .. }
        ));
    }

    #[test]
    fn private_members_are_private_to_their_class() {
        let errors = errors(&with_main(
            "class A { private int secret; int peek(A other) { return other.secret; } }
             class B { int peek(A a) { return a.secret; } }",
        ));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::PrivateAccess { name, .. }] if name == "secret"
        ));
    }

    #[test]
    fn array_length_is_synthesized_per_occurrence() {
        let package = assert_clean(&with_main(
            "class A { int f(int[] a) { return a.length + a.length; } }",
        ));
        let lengths = package
            .decls
            .iter()
            .filter(|(_, decl)| matches!(decl.kind, DeclKind::ArrayLength))
            .count();
        assert_eq!(lengths, 2);
    }

    #[test]
    fn array_length_cannot_be_assigned() {
        let errors = errors(&with_main("class A { void f(int[] a) { a.length = 3; } }"));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::ArrayLengthMisuse { usage: "assigned to", .. }]
        ));
    }

    #[test]
    fn member_of_non_object() {
        let errors = errors(&with_main("class A { void f(int x) { int y = x.foo; } }"));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::NotAnObject { .. }]
        ));
    }

    #[test]
    fn indexing_a_non_array_reference() {
        let errors = errors(&with_main("class A { void f(int x) { x[0] = 1; } }"));
        assert!(matches!(errors.as_slice(), [CompilationError::NotAnArray { .. }]));
    }

    #[test]
    fn this_cannot_be_assigned_or_called() {
        let errors = errors(&with_main("class A { void f() { this = null; } }"));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::IllegalThis { usage: "assigned to", .. }]
        ));
    }

    #[test]
    fn instance_field_initializer_rejected() {
        let errors = errors(&with_main("class A { int x = 3; static int y = 4; }"));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::InstanceFieldInitializer { name, .. }] if name == "x"
        ));
    }

    #[test]
    fn declaration_as_conditional_body() {
        let errors = errors(&with_main(
            "class A { void f(boolean b) { if (b) int x = 1; while (b) int y = 2; } }",
        ));
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .all(|e| matches!(e, CompilationError::ConditionalDeclaration { .. }))
        );
    }

    #[test]
    fn for_scope_ends_with_statement() {
        let errors = errors(&with_main(
            "class A { void f() { for (int i = 0; i < 3; i = i + 1) { } int j = i; } }",
        ));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::UndefinedName { name, .. }] if name == "i"
        ));
    }

    #[test]
    fn main_method_rules() {
        let (_, missing) = identify("class A { static void main(int[] args) { } }");
        assert!(matches!(missing.errors(), [CompilationError::MissingMain]));

        let (_, private) =
            identify("class A { private static void main(String[] args) { } }");
        assert!(matches!(private.errors(), [CompilationError::MissingMain]));

        let (_, twice) = identify(
            "class A { public static void main(String[] a) { } }
             class B { public static void main(String[] b) { } }",
        );
        assert!(matches!(twice.errors(), [CompilationError::DuplicateMain { .. }]));
        assert_eq!(twice.errors()[0].category(), ErrorCategory::Structural);
    }

    #[test]
    fn static_initializer_reads_other_class() {
        assert_clean(
            "class Main {
                static int i = 1 + Other.i;
                public static void main(String[] args) { }
            }
            class Other { static int i = 4 + Main.i; }",
        );
    }

    #[test]
    fn chain_through_class_declared_later() {
        let package = assert_clean(
            "class Main {
                public static void main(String[] args) {
                    N n = new N();
                    n.next = new N();
                    n.next.v = 42;
                    Q q = new Q();
                    int w = q.r.w;
                }
            }
            class N { N next; int v; }
            class Q { R r; }
            class R { int w; }",
        );
        let Stmt::Assign(assign) = &package.classes[0].methods[0].body[2] else {
            panic!("expected assignment");
        };
        assert_eq!(assign.target.decl(), package.member("N", "v"));
    }

    #[test]
    fn undefined_class_is_reported_once() {
        let errors = errors(&with_main(
            "class A { void f() { B b = null; b.foo(); int x = b.y; } }",
        ));
        assert!(matches!(
            errors.as_slice(),
            [CompilationError::UndefinedClass { name, .. }] if name == "B"
        ));
    }
}
