//! Operation codes, registers and primitive routines.
//!
//! The machine is a word-addressed stack machine. Every instruction has the
//! shape `op r n d`: an operation, a register, a small count and a
//! displacement. Which fields matter depends on the operation.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Loads and stores
    // =========================================================================
    /// Push the literal `d`.
    LoadL = 0,
    /// Push the word at `d[r]`.
    Load,
    /// Push the address `d[r]`.
    LoadA,
    /// Pop an address, push the word stored there.
    LoadI,
    /// Pop a word into `d[r]`.
    Store,
    /// Pop a value, then an address, and store the value at the address.
    StoreI,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Call the routine at `d[CB]`.
    Call,
    /// Pop a receiver into `OB`, then call the routine at `d[CB]`.
    CallI,
    /// Run primitive routine number `d`.
    CallPrim,
    /// Return from a routine, keeping `n` result words and popping `d`
    /// argument words.
    Return,

    // =========================================================================
    // Stack and control
    // =========================================================================
    /// Discard `d` words.
    Pop,
    /// Jump to `d[CB]`.
    Jump,
    /// Pop a word and jump to `d[CB]` if it equals `n`.
    JumpIf,
    /// Stop execution.
    Halt,
}

impl OpCode {
    /// Mnemonic used by the disassembler.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::LoadL => "LOADL",
            OpCode::Load => "LOAD",
            OpCode::LoadA => "LOADA",
            OpCode::LoadI => "LOADI",
            OpCode::Store => "STORE",
            OpCode::StoreI => "STOREI",
            OpCode::Call => "CALL",
            OpCode::CallI => "CALLI",
            OpCode::CallPrim => "CALL",
            OpCode::Return => "RETURN",
            OpCode::Pop => "POP",
            OpCode::Jump => "JUMP",
            OpCode::JumpIf => "JUMPIF",
            OpCode::Halt => "HALT",
        }
    }

    /// Whether `d` holds a code address.
    pub fn targets_code(self) -> bool {
        matches!(
            self,
            OpCode::Call | OpCode::CallI | OpCode::Jump | OpCode::JumpIf
        )
    }
}

/// Machine registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    /// Code base.
    #[default]
    Cb = 0,
    /// Stack base, start of the static segment.
    Sb,
    /// Local base, start of the current frame.
    Lb,
    /// Object base, the receiver of the current instance routine.
    Ob,
    /// Stack top, the first free word.
    St,
    /// Heap base.
    Hb,
    /// Always zero.
    Zr,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Register::Cb => "CB",
            Register::Sb => "SB",
            Register::Lb => "LB",
            Register::Ob => "OB",
            Register::St => "ST",
            Register::Hb => "HB",
            Register::Zr => "ZR",
        })
    }
}

/// Primitive routines run by `CALLPRIM`.
///
/// Stack effects are written bottom to top, e.g. `a b -> a+b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Primitive {
    /// `b -> !b`
    Not = 0,
    /// `a b -> a & b`
    And,
    /// `a b -> a | b`
    Or,
    /// `a -> -a`
    Neg,
    Add,
    Sub,
    Mult,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    /// `tag size -> object`
    NewObj,
    /// `size -> array`
    NewArr,
    /// `array index -> element`
    ArrayRef,
    /// `array index value ->`
    ArrayUpd,
    /// `array -> length`
    ArrayLen,
    /// `object field -> value`
    FieldRef,
    /// `object field value ->`
    FieldUpd,
    /// `value ->`, prints the value and a newline.
    PutIntNl,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Not => "not",
            Primitive::And => "and",
            Primitive::Or => "or",
            Primitive::Neg => "neg",
            Primitive::Add => "add",
            Primitive::Sub => "sub",
            Primitive::Mult => "mult",
            Primitive::Div => "div",
            Primitive::Lt => "lt",
            Primitive::Le => "le",
            Primitive::Gt => "gt",
            Primitive::Ge => "ge",
            Primitive::Eq => "eq",
            Primitive::Ne => "ne",
            Primitive::NewObj => "newobj",
            Primitive::NewArr => "newarr",
            Primitive::ArrayRef => "arrayref",
            Primitive::ArrayUpd => "arrayupd",
            Primitive::ArrayLen => "arraylen",
            Primitive::FieldRef => "fieldref",
            Primitive::FieldUpd => "fieldupd",
            Primitive::PutIntNl => "putintnl",
        }
    }

    /// Decode the primitive number carried in an instruction operand.
    pub fn from_operand(d: i32) -> Option<Self> {
        u8::try_from(d).ok().and_then(|raw| Self::try_from(raw).ok())
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
