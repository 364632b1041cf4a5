//! A single machine instruction.

use std::fmt;

use super::{OpCode, Primitive, Register};

/// One instruction: `op r n d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub op: OpCode,
    pub r: Register,
    pub n: i32,
    pub d: i32,
}

impl Instruction {
    pub const fn new(op: OpCode, r: Register, n: i32, d: i32) -> Self {
        Self { op, r, n, d }
    }

    /// An instruction that only uses its displacement.
    pub const fn with_d(op: OpCode, d: i32) -> Self {
        Self::new(op, Register::Cb, 0, d)
    }

    pub const fn prim(primitive: Primitive) -> Self {
        Self::with_d(OpCode::CallPrim, primitive as i32)
    }

    /// The primitive routine of a `CALLPRIM`.
    pub fn primitive(&self) -> Option<Primitive> {
        match self.op {
            OpCode::CallPrim => Primitive::from_operand(self.d),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.op.name();
        match self.op {
            OpCode::LoadL | OpCode::Pop => write!(f, "{name:<8}{}", self.d),
            OpCode::Load | OpCode::LoadA | OpCode::Store => {
                write!(f, "{name:<8}{}[{}]", self.d, self.r)
            }
            OpCode::Call | OpCode::CallI | OpCode::Jump => {
                write!(f, "{name:<8}{}[CB]", self.d)
            }
            OpCode::JumpIf => write!(f, "{name:<8}({}) {}[CB]", self.n, self.d),
            OpCode::Return => write!(f, "{name:<8}({}) {}", self.n, self.d),
            OpCode::CallPrim => match self.primitive() {
                Some(primitive) => write!(f, "{name:<8}{primitive}"),
                None => write!(f, "{name:<8}<prim {}>", self.d),
            },
            OpCode::LoadI | OpCode::StoreI | OpCode::Halt => f.write_str(name),
        }
    }
}
