//! Bottom-up expression typing.

use minijava_core::{CompilationError, Span};
use minijava_parser::ast::{
    builtins, BinaryExpr, BinaryOp, CallExpr, DeclId, DeclKind, Expr, Literal, Reference,
    TypeDenoter, UnaryExpr, UnaryOp,
};

use super::TypeChecker;

impl TypeChecker<'_> {
    /// Compute the type of `expr`, reporting any error inside it.
    ///
    /// A failed sub-expression yields [`TypeDenoter::Error`], which matches
    /// anything, so one mistake produces one report.
    pub(super) fn check_expr(&mut self, expr: &Expr) -> TypeDenoter {
        match expr {
            Expr::Literal(lit) => match lit.value {
                Literal::Int(_) => TypeDenoter::Int,
                Literal::Bool(_) => TypeDenoter::Boolean,
                Literal::Null => TypeDenoter::Error,
            },
            Expr::Ref(reference) => self.reference_type(reference),
            Expr::Index(index) => {
                let base = self.reference_type(&index.base);
                let element = self.element_type(&base, index.base.span());
                self.check_index(&index.index);
                element
            }
            Expr::Call(call) => self.check_call(call),
            Expr::Unary(unary) => self.check_unary(unary),
            Expr::Binary(binary) => self.check_binary(binary),
            Expr::NewObject(new) => {
                if let Some(class) = new.class.decl() {
                    let decls = self.decls;
                    let ctor = decls[class]
                        .class_info()
                        .and_then(|info| info.constructor);
                    if let Some(ctor) = ctor {
                        self.check_arguments(ctor, &new.args, new.span);
                    }
                }
                if new.class.decl() == Some(builtins::STRING) {
                    TypeDenoter::Unsupported
                } else {
                    TypeDenoter::Class(new.class.clone())
                }
            }
            Expr::NewArray(new) => {
                self.check_index(&new.size);
                TypeDenoter::array(new.element.clone())
            }
        }
    }

    /// Type of the declaration a reference is bound to.
    ///
    /// Values of the built-in `String` class cannot be used by this
    /// language, so they type as [`TypeDenoter::Unsupported`].
    pub(super) fn reference_type(&self, reference: &Reference) -> TypeDenoter {
        let Some(decl) = reference.decl() else {
            return TypeDenoter::Error;
        };
        let ty = &self.decls[decl].ty;
        if ty.class_decl() == Some(builtins::STRING) {
            TypeDenoter::Unsupported
        } else {
            ty.clone()
        }
    }

    /// Element type of an indexed base.
    pub(super) fn element_type(&mut self, base: &TypeDenoter, span: Span) -> TypeDenoter {
        match base {
            TypeDenoter::Array(element) => (**element).clone(),
            TypeDenoter::Error => TypeDenoter::Error,
            other => {
                self.report(CompilationError::NotIndexable {
                    ty: other.to_string(),
                    span,
                });
                TypeDenoter::Error
            }
        }
    }

    /// Array indices and sizes must be `int`.
    pub(super) fn check_index(&mut self, index: &Expr) {
        let found = self.check_expr(index);
        self.expect_type(&TypeDenoter::Int, &found, index.span());
    }

    /// Check a call and return the callee's result type.
    pub(super) fn check_call(&mut self, call: &CallExpr) -> TypeDenoter {
        let Some(callee) = call.callee.decl() else {
            for arg in &call.args {
                self.check_expr(arg);
            }
            return TypeDenoter::Error;
        };
        let decls = self.decls;
        if !matches!(decls[callee].kind, DeclKind::Method(_)) {
            return TypeDenoter::Error;
        }
        self.check_arguments(callee, &call.args, call.span);
        decls[callee].ty.clone()
    }

    /// Arguments are matched positionally against the parameter list.
    fn check_arguments(&mut self, callee: DeclId, args: &[Expr], span: Span) {
        let decls = self.decls;
        let params = decls[callee].params();

        let found: Vec<TypeDenoter> = args.iter().map(|arg| self.check_expr(arg)).collect();
        if params.len() != args.len() {
            self.report(CompilationError::ArgumentCount {
                name: decls[callee].name.clone(),
                expected: params.len(),
                found: args.len(),
                span,
            });
            return;
        }

        for ((param, arg), ty) in params.iter().zip(args).zip(&found) {
            self.expect_type(&decls[*param].ty, ty, arg.span());
        }
    }

    fn check_unary(&mut self, unary: &UnaryExpr) -> TypeDenoter {
        let operand = self.check_expr(&unary.operand);
        let expected = match unary.op {
            UnaryOp::Not => TypeDenoter::Boolean,
            UnaryOp::Neg => TypeDenoter::Int,
        };
        if expected.matches(&operand) {
            return expected;
        }
        self.report(CompilationError::InvalidOperand {
            op: unary.op.to_string(),
            operand: operand.to_string(),
            span: unary.span,
        });
        TypeDenoter::Error
    }

    fn check_binary(&mut self, binary: &BinaryExpr) -> TypeDenoter {
        let left = self.check_expr(&binary.left);
        let right = self.check_expr(&binary.right);

        let (operand, result) = match binary.op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                (Some(TypeDenoter::Int), TypeDenoter::Int)
            }
            BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => (Some(TypeDenoter::Int), TypeDenoter::Boolean),
            BinaryOp::And | BinaryOp::Or => (Some(TypeDenoter::Boolean), TypeDenoter::Boolean),
            BinaryOp::Equal | BinaryOp::NotEqual => (None, TypeDenoter::Boolean),
        };

        let accepted = match &operand {
            Some(operand) => operand.matches(&left) && operand.matches(&right),
            // Equality compares any two values of matching type.
            None => left.matches(&right) && !left.is_void() && !right.is_void(),
        };
        if accepted {
            return result;
        }

        self.report(CompilationError::InvalidOperands {
            op: binary.op.to_string(),
            left: left.to_string(),
            right: right.to_string(),
            span: binary.span,
        });
        TypeDenoter::Error
    }
}
