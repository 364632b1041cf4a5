//! Bytecode types for the MiniJava compiler.
//!
//! This module contains the core bytecode types:
//!
//! - [`OpCode`], [`Register`], [`Primitive`] - The instruction set for the VM
//! - [`Instruction`] - One decoded instruction with its operands
//! - [`Program`] - The complete instruction stream plus line information

mod instruction;
mod opcode;
mod program;

pub use instruction::Instruction;
pub use opcode::{OpCode, Primitive, Register};
pub use program::Program;

/// Words of bookkeeping at the base of every call frame: saved object
/// base, dynamic link and return address. Locals start at this offset.
pub const FRAME_SIZE: i32 = 3;

/// Address written into call and jump instructions until the real target
/// is known.
pub const PLACEHOLDER: i32 = -1;
