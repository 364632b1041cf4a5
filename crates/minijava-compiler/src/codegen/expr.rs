//! Expression lowering. Every expression leaves exactly one word.

use minijava_parser::ast::{
    BinaryExpr, BinaryOp, CallExpr, Expr, Literal, NewObjectExpr, Reference, UnaryOp, builtins,
};

use super::CodeGenerator;
use crate::bytecode::{Primitive, Register};

impl CodeGenerator<'_> {
    pub(super) fn emit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(lit) => self.emitter.emit_literal(match lit.value {
                Literal::Int(value) => value,
                Literal::Bool(value) => i32::from(value),
                Literal::Null => 0,
            }),
            Expr::Ref(reference) => self.emit_load_reference(reference),
            Expr::Index(index) => {
                let kind = self.emit_reference(&index.base);
                self.materialize(kind);
                self.emit_expr(&index.index);
                self.emitter.emit_prim(Primitive::ArrayRef);
            }
            Expr::Call(call) => {
                self.emit_call(call);
            }
            Expr::Unary(unary) => {
                self.emit_expr(&unary.operand);
                self.emitter.emit_prim(match unary.op {
                    UnaryOp::Not => Primitive::Not,
                    UnaryOp::Neg => Primitive::Neg,
                });
            }
            Expr::Binary(binary) if binary.op.is_short_circuit() => {
                self.emit_short_circuit(binary)
            }
            Expr::Binary(binary) => {
                self.emit_expr(&binary.left);
                self.emit_expr(&binary.right);
                self.emitter.emit_prim(binary_primitive(binary.op));
            }
            Expr::NewObject(new) => self.emit_new_object(new),
            Expr::NewArray(new) => {
                self.emit_expr(&new.size);
                self.emitter.emit_prim(Primitive::NewArr);
            }
        }
    }

    /// `a && b` skips `b` when `a` is false; `a || b` when `a` is true.
    fn emit_short_circuit(&mut self, binary: &BinaryExpr) {
        let decided_by = i32::from(binary.op == BinaryOp::Or);
        self.emit_expr(&binary.left);
        self.emitter.emit_load(Register::St, -1);
        let end = self.emitter.emit_jump_if(decided_by);
        self.emit_expr(&binary.right);
        self.emitter.emit_prim(binary_primitive(binary.op));
        self.emitter.patch_jump(end);
    }

    fn emit_new_object(&mut self, new: &NewObjectExpr) {
        let Some(class) = new.class.decl() else {
            return;
        };
        self.emitter.emit_literal(class.index() as i32);
        self.emitter.emit_literal(self.layout.instance_size(class));
        self.emitter.emit_prim(Primitive::NewObj);

        let ctor = self.decls[class]
            .class_info()
            .and_then(|info| info.constructor)
            .filter(|&ctor| !self.decls[ctor].is_synthesized_constructor());
        if let Some(ctor) = ctor {
            for arg in new.args.iter().rev() {
                self.emit_expr(arg);
            }
            // Duplicate the new object below the arguments as the receiver.
            self.emitter
                .emit_load(Register::St, -(new.args.len() as i32 + 1));
            self.emitter.emit_call_instance(ctor);
        }
    }

    /// Emit a call. Returns whether it leaves a result on the stack.
    pub(super) fn emit_call(&mut self, call: &CallExpr) -> bool {
        let Some(method) = call.callee.decl() else {
            return false;
        };

        if method == builtins::PRINTLN {
            for arg in &call.args {
                self.emit_expr(arg);
            }
            self.emitter.emit_prim(Primitive::PutIntNl);
            return false;
        }

        for arg in call.args.iter().rev() {
            self.emit_expr(arg);
        }

        let is_static = self.decls[method].is_static();
        match &call.callee {
            Reference::Qualified(qual) => {
                let base = self.emit_reference(&qual.base);
                if is_static {
                    self.discard(base);
                } else {
                    self.materialize(base);
                }
            }
            _ if !is_static => self.emitter.emit_load_address(Register::Ob, 0),
            _ => {}
        }

        if is_static {
            self.emitter.emit_call(method);
        } else {
            self.emitter.emit_call_instance(method);
        }
        !self.decls[method].ty.is_void()
    }
}

fn binary_primitive(op: BinaryOp) -> Primitive {
    match op {
        BinaryOp::Or => Primitive::Or,
        BinaryOp::And => Primitive::And,
        BinaryOp::Equal => Primitive::Eq,
        BinaryOp::NotEqual => Primitive::Ne,
        BinaryOp::Less => Primitive::Lt,
        BinaryOp::LessEqual => Primitive::Le,
        BinaryOp::Greater => Primitive::Gt,
        BinaryOp::GreaterEqual => Primitive::Ge,
        BinaryOp::Add => Primitive::Add,
        BinaryOp::Sub => Primitive::Sub,
        BinaryOp::Mul => Primitive::Mult,
        BinaryOp::Div => Primitive::Div,
    }
}
