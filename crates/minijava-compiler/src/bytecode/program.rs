//! A complete compiled program.
//!
//! A `Program` is the instruction stream plus the source line each
//! instruction came from. Execution starts at address 0.

use std::fmt;

use super::{Instruction, OpCode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    code: Vec<Instruction>,
    /// Line numbers for debugging (parallel to code).
    lines: Vec<u32>,
}

impl Program {
    pub fn new(code: Vec<Instruction>, lines: Vec<u32>) -> Self {
        debug_assert_eq!(code.len(), lines.len());
        Self { code, lines }
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    pub fn get(&self, address: usize) -> Option<&Instruction> {
        self.code.get(address)
    }

    pub fn line_at(&self, address: usize) -> Option<u32> {
        self.lines.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// All opcodes in order.
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.code.iter().map(|instr| instr.op).collect()
    }

    /// Render one instruction per line with its address and source line.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (address, instr) in self.code.iter().enumerate() {
            let line = self.lines.get(address).copied().unwrap_or(0);
            out.push_str(&format!("{address:>5}  {:<24}; {line}\n", instr.to_string()));
        }
        out
    }

    /// Check if this program contains the given opcodes (in order, but not
    /// necessarily contiguous).
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nProgram:\n{}",
                remaining,
                self.disassemble(),
            );
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disassemble())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Primitive, Register};

    fn sample() -> Program {
        Program::new(
            vec![
                Instruction::with_d(OpCode::LoadL, 5),
                Instruction::prim(Primitive::PutIntNl),
                Instruction::new(OpCode::Halt, Register::Cb, 0, 0),
            ],
            vec![1, 1, 2],
        )
    }

    #[test]
    fn accessors() {
        let program = sample();
        assert_eq!(program.len(), 3);
        assert_eq!(program.line_at(2), Some(2));
        assert_eq!(program.get(0).map(|i| i.d), Some(5));
        assert_eq!(program.get(3), None);
    }

    #[test]
    fn disassembly_lists_every_instruction() {
        let text = sample().disassemble();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().is_some_and(|l| l.contains("LOADL   5")));
        assert!(text.contains("putintnl"));
    }

    #[test]
    fn contains_opcodes_in_order() {
        sample().assert_contains_opcodes(&[OpCode::LoadL, OpCode::Halt]);
    }

    #[test]
    #[should_panic(expected = "Missing opcodes")]
    fn contains_opcodes_failure() {
        sample().assert_contains_opcodes(&[OpCode::Halt, OpCode::LoadL]);
    }
}
