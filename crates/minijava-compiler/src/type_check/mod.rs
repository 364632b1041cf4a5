//! Type checking.
//!
//! A second traversal over the bound tree. Expression types are computed
//! bottom-up (see `expr.rs`) and compared against what their context
//! expects with [`TypeDenoter::matches`]. Every method and constructor body
//! also runs a [`ReturnTracker`] so a non-void method that can fall off its
//! end is reported.
//!
//! The pass never changes bindings; it only reads the tree and reports.

mod expr;

use log::debug;
use minijava_core::{CompilationError, Diagnostics, Span};
use minijava_parser::ast::{
    ClassDecl, DeclArena, DeclId, Expr, FieldDecl, Package, Stmt, TypeDenoter,
};

use crate::return_checker::ReturnTracker;

/// The type checking pass.
pub struct TypeChecker<'a> {
    decls: &'a DeclArena,
    diagnostics: &'a mut Diagnostics,
    /// Method or constructor whose body is being checked.
    current: Option<DeclId>,
    returns: ReturnTracker,
}

impl<'a> TypeChecker<'a> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(package: &Package, diagnostics: &mut Diagnostics) {
        let mut checker = TypeChecker {
            decls: &package.decls,
            diagnostics,
            current: None,
            returns: ReturnTracker::default(),
        };
        for class in &package.classes {
            checker.check_class(class);
        }
    }

    fn report(&mut self, error: CompilationError) {
        self.diagnostics.report(error);
    }

    /// Report a mismatch unless `found` matches `expected`.
    fn expect_type(&mut self, expected: &TypeDenoter, found: &TypeDenoter, span: Span) -> bool {
        if expected.matches(found) {
            return true;
        }
        self.report(CompilationError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        });
        false
    }

    fn check_condition(&mut self, cond: &Expr) {
        let found = self.check_expr(cond);
        if !TypeDenoter::Boolean.matches(&found) {
            self.report(CompilationError::NonBooleanCondition {
                found: found.to_string(),
                span: cond.span(),
            });
        }
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn check_class(&mut self, class: &ClassDecl) {
        debug!("type check: class '{}'", self.decls[class.decl].name);
        for field in &class.fields {
            self.check_field(field);
        }
        for method in &class.methods {
            self.check_body(method.decl, &method.body, method.span);
        }
        if let Some(ctor) = &class.constructor {
            self.check_body(ctor.decl, &ctor.body, ctor.span);
        }
    }

    fn check_field(&mut self, field: &FieldDecl) {
        if let Some(init) = &field.initializer {
            let found = self.check_expr(init);
            let decls = self.decls;
            self.expect_type(&decls[field.decl].ty, &found, init.span());
        }
    }

    fn check_body(&mut self, decl: DeclId, body: &[Stmt], span: Span) {
        let result = self.result_type(decl);
        self.current = Some(decl);
        self.returns = ReturnTracker::new(result.is_void());

        for stmt in body {
            self.check_stmt(stmt);
        }

        if !self.returns.is_satisfied() {
            self.report(CompilationError::MissingReturn {
                name: self.decls[decl].name.clone(),
                ty: result.to_string(),
                span,
            });
        }
        self.current = None;
    }

    /// What a `return` in `decl` must produce. Constructors are void.
    fn result_type(&self, decl: DeclId) -> TypeDenoter {
        let decl = &self.decls[decl];
        if decl.is_method() {
            decl.ty.clone()
        } else {
            TypeDenoter::Void
        }
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => {
                for stmt in &block.stmts {
                    self.check_stmt(stmt);
                }
            }
            Stmt::VarDecl(var) => {
                let found = self.check_expr(&var.init);
                let decls = self.decls;
                self.expect_type(&decls[var.decl].ty, &found, var.init.span());
            }
            Stmt::Assign(assign) => {
                let target = self.reference_type(&assign.target);
                let found = self.check_expr(&assign.value);
                self.expect_type(&target, &found, assign.value.span());
            }
            Stmt::IndexAssign(assign) => {
                let base = self.reference_type(&assign.target);
                let element = self.element_type(&base, assign.target.span());
                self.check_index(&assign.index);
                let found = self.check_expr(&assign.value);
                self.expect_type(&element, &found, assign.value.span());
            }
            Stmt::Call(call) => {
                self.check_call(call);
            }
            Stmt::Return(ret) => self.check_return(ret.value.as_ref(), ret.span),
            Stmt::If(if_stmt) => {
                self.check_condition(&if_stmt.cond);
                match &if_stmt.else_branch {
                    None => {
                        self.returns.enter_conditional();
                        self.check_stmt(&if_stmt.then_branch);
                        self.returns.exit_conditional();
                    }
                    Some(else_branch) => {
                        let before = self.returns.take();
                        self.check_stmt(&if_stmt.then_branch);
                        let then_branch = self.returns.take();
                        self.check_stmt(else_branch);
                        let else_returns = self.returns.take();
                        self.returns.merge(before, then_branch, else_returns);
                    }
                }
            }
            Stmt::While(while_stmt) => {
                self.check_condition(&while_stmt.cond);
                self.returns.enter_conditional();
                self.check_stmt(&while_stmt.body);
                self.returns.exit_conditional();
            }
            Stmt::For(for_stmt) => {
                if let Some(init) = &for_stmt.init {
                    self.check_stmt(init);
                }
                if let Some(cond) = &for_stmt.cond {
                    self.check_condition(cond);
                }
                if let Some(update) = &for_stmt.update {
                    self.check_stmt(update);
                }
                self.returns.enter_conditional();
                self.check_stmt(&for_stmt.body);
                self.returns.exit_conditional();
            }
        }
    }

    fn check_return(&mut self, value: Option<&Expr>, span: Span) {
        let Some(current) = self.current else {
            return;
        };
        let expected = self.result_type(current);
        let name = self.decls[current].name.clone();

        match value {
            Some(value) => {
                let found = self.check_expr(value);
                if expected.is_void() {
                    self.report(CompilationError::UnexpectedReturnValue { name, span });
                } else if self.expect_type(&expected, &found, value.span()) {
                    self.returns.record_return();
                }
            }
            None if expected.is_void() => self.returns.record_return(),
            None => self.report(CompilationError::MissingReturnValue {
                name,
                expected: expected.to_string(),
                span,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identification::Identification;
    use minijava_core::ErrorCategory;
    use minijava_parser::ast::Parser;

    fn check(source: &str) -> Diagnostics {
        let mut package =
            Parser::parse(source).unwrap_or_else(|errors| panic!("parse failed: {errors}"));
        let mut diagnostics = Diagnostics::new();
        Identification::run(&mut package, &mut diagnostics);
        assert!(
            !diagnostics.has_errors(),
            "identification failed:\n{diagnostics}"
        );
        TypeChecker::run(&package, &mut diagnostics);
        diagnostics
    }

    fn in_class(members: &str) -> String {
        format!(
            "class Main {{ public static void main(String[] args) {{ }} }}
             class A {{ {members} }}"
        )
    }

    fn assert_ok(members: &str) {
        let diagnostics = check(&in_class(members));
        assert!(!diagnostics.has_errors(), "unexpected errors:\n{diagnostics}");
    }

    fn first_error(members: &str) -> CompilationError {
        let diagnostics = check(&in_class(members));
        diagnostics
            .errors()
            .first()
            .cloned()
            .unwrap_or_else(|| panic!("expected an error for: {members}"))
    }

    #[test]
    fn operator_table() {
        assert_ok(
            "void f() {
                boolean a = 1 < 2;
                int b = 1 + 2 * 3 - 4 / 2;
                boolean c = a && true || !a;
                boolean d = b == 3;
                boolean e = a != c;
                int g = -b;
            }",
        );
    }

    #[test]
    fn arithmetic_on_boolean_is_rejected() {
        assert!(matches!(
            first_error("void f() { int x = true + 1; }"),
            CompilationError::InvalidOperands { op, .. } if op == "+"
        ));
    }

    #[test]
    fn logical_on_int_is_rejected() {
        assert!(matches!(
            first_error("void f() { boolean x = 1 && 2; }"),
            CompilationError::InvalidOperands { .. }
        ));
        assert!(matches!(
            first_error("void f() { boolean x = !3; }"),
            CompilationError::InvalidOperand { .. }
        ));
    }

    #[test]
    fn equality_needs_matching_operands() {
        assert!(matches!(
            first_error("void f() { boolean x = 1 == true; }"),
            CompilationError::InvalidOperands { .. }
        ));
        assert_ok("void f(A a) { boolean x = a == null; boolean y = a != this; }");
    }

    #[test]
    fn null_unifies_with_references() {
        assert_ok("A next; int[] items; void f() { next = null; items = null; }");
    }

    #[test]
    fn class_types_match_by_declaration() {
        let source = "class Main { public static void main(String[] args) { } }
             class A { }
             class B { void f() { A a = new B(); } }";
        let diagnostics = check(source);
        assert!(matches!(
            diagnostics.errors(),
            [CompilationError::TypeMismatch { expected, found, .. }]
                if expected == "A" && found == "B"
        ));
    }

    #[test]
    fn indexing_requires_array_and_int() {
        assert_ok("int f(int[] a) { a[0] = a[1] + 2; return a[a.length - 1]; }");
        assert!(matches!(
            first_error("int f(int[] a) { return a[true]; }"),
            CompilationError::TypeMismatch { expected, .. } if expected == "int"
        ));
        assert!(matches!(
            first_error("void f(int[] a) { a[0] = false; }"),
            CompilationError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn new_array_size_must_be_int() {
        assert!(matches!(
            first_error("void f() { int[] a = new int[false]; }"),
            CompilationError::TypeMismatch { .. }
        ));
        assert_ok("void f() { A[] items = new A[3]; items[0] = new A(); }");
    }

    #[test]
    fn call_arguments_checked_positionally() {
        assert_ok("int add(int x, boolean b) { return x; } void f() { int y = add(1, true); }");
        assert!(matches!(
            first_error("int add(int x, int y) { return x; } void f() { int z = add(1); }"),
            CompilationError::ArgumentCount { expected: 2, found: 1, .. }
        ));
        assert!(matches!(
            first_error("int id(int x) { return x; } void f() { int z = id(false); }"),
            CompilationError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn constructor_arguments_checked() {
        assert_ok("int v; A(int v0) { v = v0; } void f() { A a = new A(3); }");
        assert!(matches!(
            first_error("void f() { A a = new A(3); }"),
            CompilationError::ArgumentCount { expected: 0, found: 1, .. }
        ));
    }

    #[test]
    fn constructor_is_void() {
        assert!(matches!(
            first_error("A() { return 1; }"),
            CompilationError::UnexpectedReturnValue { .. }
        ));
    }

    #[test]
    fn conditions_must_be_boolean() {
        assert!(matches!(
            first_error("void f() { if (1) { } }"),
            CompilationError::NonBooleanCondition { .. }
        ));
        assert!(matches!(
            first_error("void f() { while (0) { } }"),
            CompilationError::NonBooleanCondition { .. }
        ));
    }

    #[test]
    fn return_only_in_if_without_else_is_rejected() {
        let error = first_error("int f(boolean b) { if (b) return 1; }");
        assert!(matches!(
            &error,
            CompilationError::MissingReturn { name, ty, .. } if name == "f" && ty == "int"
        ));
        assert_eq!(error.category(), ErrorCategory::Reachability);
    }

    #[test]
    fn return_in_both_branches_is_accepted() {
        assert_ok("int f(boolean b) { if (b) return 1; else return 2; }");
        assert_ok(
            "int f(boolean b, boolean c) {
                if (b) { return 1; } else if (c) { return 2; } else { return 3; }
            }",
        );
    }

    #[test]
    fn return_in_loop_body_is_not_enough() {
        assert!(matches!(
            first_error("int f() { while (true) { return 1; } }"),
            CompilationError::MissingReturn { .. }
        ));
        assert!(matches!(
            first_error("int f() { for (int i = 0; i < 3; i = i + 1) return i; }"),
            CompilationError::MissingReturn { .. }
        ));
    }

    #[test]
    fn return_value_must_match() {
        assert!(matches!(
            first_error("int f() { return true; }"),
            CompilationError::TypeMismatch { .. }
        ));
        assert!(matches!(
            first_error("int f() { return; }"),
            CompilationError::MissingReturnValue { .. }
        ));
        assert!(matches!(
            first_error("void f() { return 3; }"),
            CompilationError::UnexpectedReturnValue { .. }
        ));
    }

    #[test]
    fn string_values_are_unsupported() {
        assert!(matches!(
            first_error("void f(String s) { String t = s; }"),
            CompilationError::TypeMismatch { found, .. } if found == "<unsupported>"
        ));
    }

    #[test]
    fn new_string_is_unsupported() {
        assert!(matches!(
            first_error("void f() { String s = new String(); }"),
            CompilationError::TypeMismatch { found, .. } if found == "<unsupported>"
        ));
    }

    #[test]
    fn static_initializer_matches_field_type() {
        assert!(matches!(
            first_error("static int x = true;"),
            CompilationError::TypeMismatch { .. }
        ));
        assert_ok("static int x = 3 * 4;");
    }

    #[test]
    fn array_length_is_int() {
        assert!(matches!(
            first_error("boolean f(int[] a) { return a.length; }"),
            CompilationError::TypeMismatch { found, .. } if found == "int"
        ));
    }
}
