//! Statement lowering.

use minijava_parser::ast::{ForStmt, IfStmt, Stmt, WhileStmt};

use super::CodeGenerator;
use crate::bytecode::Primitive;

impl CodeGenerator<'_> {
    pub(super) fn emit_stmt(&mut self, stmt: &Stmt) {
        self.emitter.set_line(stmt.span().line);
        match stmt {
            Stmt::Block(block) => self.emit_scoped(|this| {
                for stmt in &block.stmts {
                    this.emit_stmt(stmt);
                }
            }),
            Stmt::VarDecl(var) => {
                // The initial value is left in place as the local's slot.
                let offset = self.next_local;
                self.next_local += 1;
                self.decls[var.decl].set_offset(offset);
                self.emit_expr(&var.init);
            }
            Stmt::Assign(assign) => {
                let kind = self.emit_reference(&assign.target);
                self.emit_expr(&assign.value);
                self.store_into(kind);
            }
            Stmt::IndexAssign(assign) => {
                let kind = self.emit_reference(&assign.target);
                self.materialize(kind);
                self.emit_expr(&assign.index);
                self.emit_expr(&assign.value);
                self.emitter.emit_prim(Primitive::ArrayUpd);
            }
            Stmt::Call(call) => {
                if self.emit_call(call) {
                    self.emitter.emit_pop(1);
                }
            }
            Stmt::Return(ret) => match &ret.value {
                Some(value) => {
                    self.emit_expr(value);
                    self.emitter.emit_return(1, self.arg_count);
                }
                None => self.emitter.emit_return(0, self.arg_count),
            },
            Stmt::If(if_stmt) => self.emit_if(if_stmt),
            Stmt::While(while_stmt) => self.emit_while(while_stmt),
            Stmt::For(for_stmt) => self.emit_scoped(|this| this.emit_for(for_stmt)),
        }
    }

    /// Run `body`, then drop the locals it declared.
    fn emit_scoped(&mut self, body: impl FnOnce(&mut Self)) {
        let saved = self.next_local;
        body(self);
        self.emitter.emit_pop(self.next_local - saved);
        self.next_local = saved;
    }

    fn emit_if(&mut self, stmt: &IfStmt) {
        self.emit_expr(&stmt.cond);
        let to_else = self.emitter.emit_jump_if(0);
        self.emit_stmt(&stmt.then_branch);

        match &stmt.else_branch {
            Some(else_branch) => {
                let to_end = self.emitter.emit_jump();
                self.emitter.patch_jump(to_else);
                self.emit_stmt(else_branch);
                self.emitter.patch_jump(to_end);
            }
            None => self.emitter.patch_jump(to_else),
        }
    }

    fn emit_while(&mut self, stmt: &WhileStmt) {
        let start = self.emitter.current_offset();
        self.emit_expr(&stmt.cond);
        let exit = self.emitter.emit_jump_if(0);
        self.emit_stmt(&stmt.body);
        self.emitter.emit_loop(start);
        self.emitter.patch_jump(exit);
    }

    /// The init clause's local is popped by the enclosing scope.
    fn emit_for(&mut self, stmt: &ForStmt) {
        if let Some(init) = &stmt.init {
            self.emit_stmt(init);
        }

        let start = self.emitter.current_offset();
        let exit = stmt.cond.as_ref().map(|cond| {
            self.emit_expr(cond);
            self.emitter.emit_jump_if(0)
        });

        self.emit_stmt(&stmt.body);
        if let Some(update) = &stmt.update {
            self.emit_stmt(update);
        }
        self.emitter.emit_loop(start);

        if let Some(exit) = exit {
            self.emitter.patch_jump(exit);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bytecode::{Instruction, OpCode, Primitive, Program};
    use crate::codegen::CodeGenerator;
    use crate::identification::Identification;
    use crate::type_check::TypeChecker;
    use minijava_core::Diagnostics;
    use minijava_parser::ast::Parser;

    fn generate_main(body: &str) -> Program {
        let source = format!("class Main {{ public static void main(String[] args) {{ {body} }} }}");
        let mut package =
            Parser::parse(&source).unwrap_or_else(|errors| panic!("parse failed: {errors}"));
        let mut diagnostics = Diagnostics::new();
        Identification::run(&mut package, &mut diagnostics);
        TypeChecker::run(&package, &mut diagnostics);
        let program = CodeGenerator::run(&mut package, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{diagnostics}");
        program.unwrap_or_else(|| panic!("no program generated"))
    }

    fn jump_targets(program: &Program) -> Vec<i32> {
        program
            .code()
            .iter()
            .filter(|i| matches!(i.op, OpCode::Jump | OpCode::JumpIf))
            .map(|i| i.d)
            .collect()
    }

    #[test]
    fn if_without_else_jumps_past_then() {
        let program = generate_main("int x = 1; if (x < 2) x = 3;");
        let code = program.code();
        let branch = code
            .iter()
            .position(|i| i.op == OpCode::JumpIf)
            .unwrap_or_else(|| panic!("no JUMPIF:\n{program}"));
        assert_eq!(code[branch].n, 0);
        // then: LOADA, LOADL, STOREI
        assert_eq!(code[branch].d as usize, branch + 4);
    }

    #[test]
    fn if_else_skips_else_branch() {
        let program = generate_main("int x = 1; if (x < 2) x = 3; else x = 4;");
        let code = program.code();
        let branch = code.iter().position(|i| i.op == OpCode::JumpIf).unwrap();
        let skip = code.iter().position(|i| i.op == OpCode::Jump).unwrap();
        assert_eq!(code[branch].d as usize, skip + 1);
        assert_eq!(code[skip].d as usize, skip + 4);
    }

    #[test]
    fn while_loops_back_to_condition() {
        let program = generate_main("int i = 0; while (i < 3) i = i + 1;");
        let code = program.code();
        let back = code.iter().rposition(|i| i.op == OpCode::Jump).unwrap();
        let exit = code.iter().position(|i| i.op == OpCode::JumpIf).unwrap();
        assert!((code[back].d as usize) < exit);
        assert_eq!(code[exit].d as usize, back + 1);
    }

    #[test]
    fn for_pops_its_counter() {
        let program = generate_main("for (int i = 0; i < 3; i = i + 1) { int sq = i * i; }");
        let code = program.code();
        assert_eq!(jump_targets(&program).len(), 2);

        let back = code.iter().rposition(|i| i.op == OpCode::Jump).unwrap();
        // Body block pops `sq`, the loop scope pops `i` after the exit target.
        assert!(code[..back].contains(&Instruction::with_d(OpCode::Pop, 1)));
        assert_eq!(code[back + 1], Instruction::with_d(OpCode::Pop, 1));
    }

    #[test]
    fn for_without_condition_loops_unconditionally() {
        let program = generate_main("for (;;) { return; }");
        assert!(program.code().iter().all(|i| i.op != OpCode::JumpIf));
        assert_eq!(jump_targets(&program).len(), 1);
    }

    #[test]
    fn index_assignment_updates_array() {
        let program = generate_main("int[] xs = new int[2]; xs[1] = 7;");
        program.assert_contains_opcodes(&[OpCode::LoadA, OpCode::LoadI, OpCode::LoadL, OpCode::LoadL]);
        assert!(
            program
                .code()
                .iter()
                .any(|i| i.primitive() == Some(Primitive::ArrayUpd))
        );
    }

    #[test]
    fn return_drops_arguments() {
        let source = "class Main {
            public static void main(String[] args) { }
            static int pick(int a, int b, boolean c) { if (c) return a; return b; }
        }";
        let mut package = Parser::parse(source).unwrap();
        let mut diagnostics = Diagnostics::new();
        Identification::run(&mut package, &mut diagnostics);
        TypeChecker::run(&package, &mut diagnostics);
        let program = CodeGenerator::run(&mut package, &mut diagnostics).unwrap();

        let returns: Vec<&Instruction> = program
            .code()
            .iter()
            .filter(|i| i.op == OpCode::Return)
            .collect();
        // main's implicit return, two explicit returns, pick's implicit return
        assert_eq!(returns.len(), 4);
        assert_eq!((returns[1].n, returns[1].d), (1, 3));
        assert_eq!((returns[2].n, returns[2].d), (1, 3));
        assert_eq!((returns[3].n, returns[3].d), (0, 3));
    }
}
