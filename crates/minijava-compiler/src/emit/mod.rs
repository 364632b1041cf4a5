//! Bytecode emitter for the MiniJava compiler.
//!
//! The [`BytecodeEmitter`] provides a high-level API for generating
//! instructions, handling jumps and calls whose targets are not known yet.
//!
//! # Example
//!
//! ```
//! use minijava_compiler::bytecode::{OpCode, Primitive};
//! use minijava_compiler::emit::BytecodeEmitter;
//!
//! let mut emitter = BytecodeEmitter::new();
//! emitter.set_line(1);
//! emitter.emit_literal(2);
//! emitter.emit_literal(3);
//! emitter.emit_prim(Primitive::Add);
//! emitter.emit_prim(Primitive::PutIntNl);
//! emitter.emit_halt();
//!
//! let program = emitter.finish().unwrap();
//! assert_eq!(program.len(), 5);
//! ```

mod patch;

pub use patch::{Patch, PatchList};

use minijava_parser::ast::DeclId;
use rustc_hash::FxHashMap;

use crate::bytecode::{Instruction, OpCode, PLACEHOLDER, Primitive, Program, Register};

/// A forward jump awaiting its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a jump label must be patched"]
pub struct JumpLabel(usize);

impl JumpLabel {
    /// Address of the jump instruction.
    pub fn address(self) -> usize {
        self.0
    }
}

/// Emits instructions into a single program.
#[derive(Debug, Default)]
pub struct BytecodeEmitter {
    code: Vec<Instruction>,
    lines: Vec<u32>,
    current_line: u32,
    /// Entry address of every routine emitted so far.
    entries: FxHashMap<DeclId, usize>,
    patches: PatchList,
}

impl BytecodeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set current source line for debug info.
    ///
    /// All subsequent instructions will be associated with this line number.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    /// Address of the next instruction.
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Append an instruction and return its address.
    pub fn emit(&mut self, instr: Instruction) -> usize {
        let address = self.code.len();
        self.code.push(instr);
        self.lines.push(self.current_line);
        address
    }

    pub fn emit_literal(&mut self, value: i32) {
        self.emit(Instruction::with_d(OpCode::LoadL, value));
    }

    pub fn emit_load(&mut self, r: Register, d: i32) {
        self.emit(Instruction::new(OpCode::Load, r, 1, d));
    }

    pub fn emit_load_address(&mut self, r: Register, d: i32) {
        self.emit(Instruction::new(OpCode::LoadA, r, 0, d));
    }

    pub fn emit_load_indirect(&mut self) {
        self.emit(Instruction::new(OpCode::LoadI, Register::Cb, 1, 0));
    }

    pub fn emit_store(&mut self, r: Register, d: i32) {
        self.emit(Instruction::new(OpCode::Store, r, 1, d));
    }

    pub fn emit_store_indirect(&mut self) {
        self.emit(Instruction::new(OpCode::StoreI, Register::Cb, 1, 0));
    }

    pub fn emit_prim(&mut self, primitive: Primitive) {
        self.emit(Instruction::prim(primitive));
    }

    /// Discard `count` words. Nothing is emitted for zero.
    pub fn emit_pop(&mut self, count: i32) {
        if count > 0 {
            self.emit(Instruction::with_d(OpCode::Pop, count));
        }
    }

    pub fn emit_return(&mut self, results: i32, args: i32) {
        self.emit(Instruction::new(OpCode::Return, Register::Cb, results, args));
    }

    pub fn emit_halt(&mut self) {
        self.emit(Instruction::with_d(OpCode::Halt, 0));
    }

    // ==========================================================================
    // Jumps
    // ==========================================================================

    /// Emit an unconditional forward jump.
    pub fn emit_jump(&mut self) -> JumpLabel {
        JumpLabel(self.emit(Instruction::with_d(OpCode::Jump, PLACEHOLDER)))
    }

    /// Emit a forward jump taken when the popped word equals `value`.
    pub fn emit_jump_if(&mut self, value: i32) -> JumpLabel {
        JumpLabel(self.emit(Instruction::new(
            OpCode::JumpIf,
            Register::Cb,
            value,
            PLACEHOLDER,
        )))
    }

    /// Patch a forward jump to the current position.
    pub fn patch_jump(&mut self, label: JumpLabel) {
        let target = self.current_offset() as i32;
        if let Some(instr) = self.code.get_mut(label.0) {
            debug_assert!(instr.op.targets_code());
            instr.d = target;
        }
    }

    /// Emit a backward jump to `target`.
    pub fn emit_loop(&mut self, target: usize) {
        self.emit(Instruction::with_d(OpCode::Jump, target as i32));
    }

    // ==========================================================================
    // Routines
    // ==========================================================================

    /// Record that the routine `decl` starts at the current position.
    pub fn begin_routine(&mut self, decl: DeclId) -> usize {
        let address = self.current_offset();
        self.entries.insert(decl, address);
        address
    }

    /// Emit `CALL` to a static routine.
    pub fn emit_call(&mut self, target: DeclId) {
        self.emit_routine_call(OpCode::Call, target);
    }

    /// Emit `CALLI` to an instance routine; the receiver is on the stack.
    pub fn emit_call_instance(&mut self, target: DeclId) {
        self.emit_routine_call(OpCode::CallI, target);
    }

    fn emit_routine_call(&mut self, op: OpCode, target: DeclId) {
        match self.entries.get(&target) {
            Some(&entry) => {
                self.emit(Instruction::with_d(op, entry as i32));
            }
            None => {
                let address = self.emit(Instruction::with_d(op, PLACEHOLDER));
                self.patches.push(address, target);
            }
        }
    }

    /// Number of calls still waiting for their target.
    pub fn pending_patches(&self) -> usize {
        self.patches.len()
    }

    /// Resolve the patch list and produce the program.
    ///
    /// Fails with the patches whose target was never emitted.
    pub fn finish(self) -> Result<Program, Vec<Patch>> {
        let BytecodeEmitter {
            mut code,
            lines,
            entries,
            patches,
            ..
        } = self;
        let unresolved = patches.resolve(&mut code, &entries);
        if unresolved.is_empty() {
            Ok(Program::new(code, lines))
        } else {
            Err(unresolved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_follow_set_line() {
        let mut emitter = BytecodeEmitter::new();
        emitter.set_line(3);
        emitter.emit_literal(1);
        emitter.set_line(4);
        emitter.emit_pop(1);
        emitter.emit_pop(0);

        let program = emitter.finish().unwrap();
        assert_eq!(program.lines(), &[3, 4]);
    }

    #[test]
    fn emit_and_patch_jump() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_literal(1);
        let label = emitter.emit_jump_if(0);
        emitter.emit_literal(2);
        emitter.emit_pop(1);
        emitter.patch_jump(label);
        emitter.emit_halt();

        let program = emitter.finish().unwrap();
        let jump = program.code()[label.address()];
        assert_eq!(jump.op, OpCode::JumpIf);
        assert_eq!(jump.n, 0);
        assert_eq!(jump.d, 4);
    }

    #[test]
    fn loop_jumps_backward() {
        let mut emitter = BytecodeEmitter::new();
        let start = emitter.current_offset();
        emitter.emit_literal(0);
        emitter.emit_pop(1);
        emitter.emit_loop(start);

        let program = emitter.finish().unwrap();
        assert_eq!(program.code()[2], Instruction::with_d(OpCode::Jump, 0));
    }

    #[test]
    fn forward_call_is_patched() {
        let method = DeclId::from_raw(20);
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_call(method);
        emitter.emit_halt();
        assert_eq!(emitter.pending_patches(), 1);

        emitter.begin_routine(method);
        emitter.emit_return(0, 0);

        let program = emitter.finish().unwrap();
        assert_eq!(program.code()[0].d, 2);
    }

    #[test]
    fn backward_call_needs_no_patch() {
        let method = DeclId::from_raw(20);
        let mut emitter = BytecodeEmitter::new();
        emitter.begin_routine(method);
        emitter.emit_return(0, 0);
        emitter.emit_call_instance(method);

        assert_eq!(emitter.pending_patches(), 0);
        let program = emitter.finish().unwrap();
        assert_eq!(program.code()[1], Instruction::with_d(OpCode::CallI, 0));
    }

    #[test]
    fn missing_routine_is_reported() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_call(DeclId::from_raw(5));
        let unresolved = emitter.finish().unwrap_err();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].address, 0);
    }
}
