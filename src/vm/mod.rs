//! Interpreter for generated programs.
//!
//! Executes a [`Program`] on a word-addressed [`Memory`]. Registers:
//!
//! | Register | Meaning                                   |
//! |----------|-------------------------------------------|
//! | `CB`     | code base, always 0                       |
//! | `SB`     | stack base, always 0; statics live here    |
//! | `LB`     | local base of the current frame            |
//! | `OB`     | object base, the current `this`            |
//! | `ST`     | stack top, first free word                 |
//! | `HB`     | heap base, lowest heap word                |
//!
//! A call frame is three words at `LB`: saved `OB`, the caller's `LB` and
//! the return address. Arguments sit directly below `LB`.

pub mod memory;

use std::io::Write;

use log::{debug, trace};
use minijava_compiler::{Instruction, OpCode, Primitive, Program, Register};
use minijava_core::RuntimeError;

pub use memory::{ARRAY_TAG, Fault, Memory};

/// Machine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Size of the data store in words, shared by stack and heap.
    pub memory_words: usize,
    /// Abort after this many instructions.
    pub max_steps: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_words: 1 << 16,
            max_steps: None,
        }
    }
}

impl VmConfig {
    pub fn with_memory_words(mut self, words: usize) -> Self {
        self.memory_words = words;
        self
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }
}

/// Counters from a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Instructions executed, `HALT` included.
    pub steps: u64,
    /// Highest stack top reached.
    pub max_stack: usize,
    /// Heap words in use at exit.
    pub heap_words: usize,
}

/// What the dispatch loop does after an instruction.
enum Flow {
    Next,
    Jump(usize),
    Halt,
}

pub struct Vm<'p> {
    program: &'p Program,
    config: VmConfig,
    memory: Memory,
    pc: usize,
    lb: usize,
    ob: i32,
    stats: ExecutionStats,
}

impl<'p> Vm<'p> {
    pub fn new(program: &'p Program, config: VmConfig) -> Self {
        Self {
            program,
            config,
            memory: Memory::new(config.memory_words),
            pc: 0,
            lb: 0,
            ob: 0,
            stats: ExecutionStats::default(),
        }
    }

    /// Run a program to completion, collecting its output as text.
    pub fn run_to_string(program: &Program, config: VmConfig) -> Result<String, RuntimeError> {
        let mut out = Vec::new();
        Vm::new(program, config).run(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Execute from address 0 until `HALT`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self, out: &mut impl Write) -> Result<ExecutionStats, RuntimeError> {
        loop {
            if let Some(limit) = self.config.max_steps
                && self.stats.steps >= limit
            {
                return Err(RuntimeError::StepLimitExceeded { limit });
            }
            self.stats.steps += 1;

            let instr = *self
                .program
                .get(self.pc)
                .ok_or_else(|| self.invalid("program counter outside the code segment"))?;
            trace!("{:>5}: {instr}", self.pc);

            let flow = self.execute(instr, out)?;
            self.stats.max_stack = self.stats.max_stack.max(self.memory.stack_top());
            match flow {
                Flow::Next => self.pc += 1,
                Flow::Jump(target) => self.pc = target,
                Flow::Halt => break,
            }
        }

        self.stats.heap_words = self.memory.heap_words();
        debug!(
            "vm: halted after {} steps, max stack {}, heap {}",
            self.stats.steps, self.stats.max_stack, self.stats.heap_words
        );
        Ok(self.stats)
    }

    fn execute(&mut self, instr: Instruction, out: &mut impl Write) -> Result<Flow, RuntimeError> {
        let Instruction { op, r, n, d } = instr;
        match op {
            OpCode::LoadL => self.push(d)?,
            OpCode::Load => {
                let base = self.address(r, d)?;
                for i in 0..n {
                    let value = self.read(base + i)?;
                    self.push(value)?;
                }
            }
            OpCode::LoadA => {
                let address = self.address(r, d)?;
                self.push(address)?;
            }
            OpCode::LoadI => {
                let base = self.pop()?;
                for i in 0..n {
                    let value = self.read(base + i)?;
                    self.push(value)?;
                }
            }
            OpCode::Store => {
                let base = self.address(r, d)?;
                for i in (0..n).rev() {
                    let value = self.pop()?;
                    self.write(base + i, value)?;
                }
            }
            OpCode::StoreI => {
                let value = self.pop()?;
                let address = self.pop()?;
                self.write(address, value)?;
            }
            OpCode::Call => return self.call(d, self.ob),
            OpCode::CallI => {
                let receiver = self.pop()?;
                let saved = self.ob;
                let flow = self.call(d, saved)?;
                self.ob = receiver;
                return Ok(flow);
            }
            OpCode::CallPrim => {
                let primitive = Primitive::from_operand(d)
                    .ok_or_else(|| self.invalid(format!("unknown primitive {d}")))?;
                self.primitive(primitive, out)?;
            }
            OpCode::Return => return self.ret(n, d),
            OpCode::Pop => {
                let count = self.count(d)?;
                self.memory.drop_words(count).map_err(|fault| self.fault(fault))?;
            }
            OpCode::Jump => return Ok(Flow::Jump(self.target(d)?)),
            OpCode::JumpIf => {
                let value = self.pop()?;
                if value == n {
                    return Ok(Flow::Jump(self.target(d)?));
                }
            }
            OpCode::Halt => return Ok(Flow::Halt),
        }
        Ok(Flow::Next)
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Push a frame and enter the routine at `entry`.
    fn call(&mut self, entry: i32, saved_ob: i32) -> Result<Flow, RuntimeError> {
        let target = self.target(entry)?;
        let new_lb = self.memory.stack_top();
        self.push(saved_ob)?;
        self.push(self.lb as i32)?;
        self.push(self.pc as i32 + 1)?;
        self.lb = new_lb;
        Ok(Flow::Jump(target))
    }

    /// `RETURN n d`: keep `n` result words, drop the frame and `d` arguments.
    fn ret(&mut self, results: i32, args: i32) -> Result<Flow, RuntimeError> {
        let results = self.count(results)?;
        let args = self.count(args)?;

        let mut kept = Vec::with_capacity(results);
        for _ in 0..results {
            kept.push(self.pop()?);
        }

        let frame = self.lb as i32;
        let saved_ob = self.read(frame)?;
        let dynamic_link = self.read(frame + 1)?;
        let return_address = self.read(frame + 2)?;

        let base = self
            .lb
            .checked_sub(args)
            .ok_or_else(|| self.fault(Fault::StackUnderflow))?;
        self.memory
            .set_stack_top(base)
            .map_err(|fault| self.fault(fault))?;
        for value in kept.into_iter().rev() {
            self.push(value)?;
        }

        self.ob = saved_ob;
        self.lb = self.count(dynamic_link)?;
        Ok(Flow::Jump(self.target(return_address)?))
    }

    // ==========================================================================
    // Primitives
    // ==========================================================================

    fn primitive(&mut self, primitive: Primitive, out: &mut impl Write) -> Result<(), RuntimeError> {
        match primitive {
            Primitive::Not => {
                let value = self.pop()?;
                self.push(i32::from(value == 0))?;
            }
            Primitive::Neg => {
                let value = self.pop()?;
                self.push(value.wrapping_neg())?;
            }
            Primitive::And => self.binary(|a, b| i32::from(a != 0 && b != 0))?,
            Primitive::Or => self.binary(|a, b| i32::from(a != 0 || b != 0))?,
            Primitive::Add => self.binary(i32::wrapping_add)?,
            Primitive::Sub => self.binary(i32::wrapping_sub)?,
            Primitive::Mult => self.binary(i32::wrapping_mul)?,
            Primitive::Div => {
                let divisor = self.pop()?;
                let dividend = self.pop()?;
                if divisor == 0 {
                    return Err(RuntimeError::DivisionByZero { pc: self.pc });
                }
                self.push(dividend.wrapping_div(divisor))?;
            }
            Primitive::Lt => self.binary(|a, b| i32::from(a < b))?,
            Primitive::Le => self.binary(|a, b| i32::from(a <= b))?,
            Primitive::Gt => self.binary(|a, b| i32::from(a > b))?,
            Primitive::Ge => self.binary(|a, b| i32::from(a >= b))?,
            Primitive::Eq => self.binary(|a, b| i32::from(a == b))?,
            Primitive::Ne => self.binary(|a, b| i32::from(a != b))?,
            Primitive::NewObj => {
                let size = self.pop()?;
                let tag = self.pop()?;
                let size = self.count(size)?;
                let address = self.memory.alloc(tag, size).map_err(|fault| self.fault(fault))?;
                self.push(address)?;
            }
            Primitive::NewArr => {
                let size = self.pop()?;
                let words = usize::try_from(size)
                    .map_err(|_| RuntimeError::NegativeArraySize { size, pc: self.pc })?;
                let address = self
                    .memory
                    .alloc(ARRAY_TAG, words)
                    .map_err(|fault| self.fault(fault))?;
                self.push(address)?;
            }
            Primitive::ArrayRef => {
                let index = self.pop()?;
                let array = self.pop()?;
                let element = self.element(array, index)?;
                let value = self.read(element)?;
                self.push(value)?;
            }
            Primitive::ArrayUpd => {
                let value = self.pop()?;
                let index = self.pop()?;
                let array = self.pop()?;
                let element = self.element(array, index)?;
                self.write(element, value)?;
            }
            Primitive::ArrayLen => {
                let array = self.pop()?;
                let len = self.memory.block_size(array).map_err(|fault| self.fault(fault))?;
                self.push(len)?;
            }
            Primitive::FieldRef => {
                let index = self.pop()?;
                let object = self.pop()?;
                let field = self.field(object, index)?;
                let value = self.read(field)?;
                self.push(value)?;
            }
            Primitive::FieldUpd => {
                let value = self.pop()?;
                let index = self.pop()?;
                let object = self.pop()?;
                let field = self.field(object, index)?;
                self.write(field, value)?;
            }
            Primitive::PutIntNl => {
                let value = self.pop()?;
                writeln!(out, "{value}").map_err(|err| RuntimeError::Output {
                    message: err.to_string(),
                })?;
            }
        }
        Ok(())
    }

    fn binary(&mut self, op: impl FnOnce(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(op(left, right))
    }

    fn element(&self, array: i32, index: i32) -> Result<i32, RuntimeError> {
        match self.memory.element(array, index) {
            Ok(Some(address)) => Ok(address),
            Ok(None) => Err(RuntimeError::IndexOutOfBounds {
                index,
                len: self.memory.block_size(array).unwrap_or_default(),
                pc: self.pc,
            }),
            Err(fault) => Err(self.fault(fault)),
        }
    }

    /// Fields are checked like array elements; the code generator only emits
    /// indices inside the object.
    fn field(&self, object: i32, index: i32) -> Result<i32, RuntimeError> {
        match self.memory.element(object, index) {
            Ok(Some(address)) => Ok(address),
            Ok(None) => Err(self.invalid(format!("field {index} outside object {object}"))),
            Err(fault) => Err(self.fault(fault)),
        }
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    fn register(&self, r: Register) -> i32 {
        match r {
            Register::Cb | Register::Sb | Register::Zr => 0,
            Register::Lb => self.lb as i32,
            Register::Ob => self.ob,
            Register::St => self.memory.stack_top() as i32,
            Register::Hb => self.memory.heap_base() as i32,
        }
    }

    fn address(&self, r: Register, d: i32) -> Result<i32, RuntimeError> {
        self.register(r)
            .checked_add(d)
            .ok_or_else(|| self.invalid("address overflow"))
    }

    fn target(&self, address: i32) -> Result<usize, RuntimeError> {
        usize::try_from(address)
            .ok()
            .filter(|&target| target < self.program.len())
            .ok_or_else(|| self.invalid(format!("jump to {address} outside the code segment")))
    }

    fn count(&self, value: i32) -> Result<usize, RuntimeError> {
        usize::try_from(value).map_err(|_| self.invalid(format!("negative count {value}")))
    }

    fn push(&mut self, value: i32) -> Result<(), RuntimeError> {
        self.memory.push(value).map_err(|fault| self.fault(fault))
    }

    fn pop(&mut self) -> Result<i32, RuntimeError> {
        self.memory.pop().map_err(|fault| self.fault(fault))
    }

    fn read(&self, address: i32) -> Result<i32, RuntimeError> {
        self.memory.read(address).map_err(|fault| self.fault(fault))
    }

    fn write(&mut self, address: i32, value: i32) -> Result<(), RuntimeError> {
        self.memory
            .write(address, value)
            .map_err(|fault| self.fault(fault))
    }

    fn fault(&self, fault: Fault) -> RuntimeError {
        let pc = self.pc;
        match fault {
            Fault::StackOverflow => RuntimeError::StackOverflow { pc },
            Fault::HeapExhausted => RuntimeError::HeapExhausted { pc },
            Fault::NullPointer => RuntimeError::NullPointer { pc },
            Fault::InvalidAddress(address) => RuntimeError::InvalidAddress { address, pc },
            Fault::StackUnderflow => self.invalid(fault.to_string()),
        }
    }

    fn invalid(&self, detail: impl Into<String>) -> RuntimeError {
        RuntimeError::InvalidInstruction {
            pc: self.pc,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(code: Vec<Instruction>) -> Program {
        let lines = vec![0; code.len()];
        Program::new(code, lines)
    }

    fn lit(value: i32) -> Instruction {
        Instruction::with_d(OpCode::LoadL, value)
    }

    fn prim(primitive: Primitive) -> Instruction {
        Instruction::prim(primitive)
    }

    fn halt() -> Instruction {
        Instruction::with_d(OpCode::Halt, 0)
    }

    fn run(code: Vec<Instruction>) -> Result<String, RuntimeError> {
        Vm::run_to_string(&program(code), VmConfig::default().with_memory_words(256))
    }

    #[test]
    fn arithmetic_and_output() {
        let output = run(vec![
            lit(6),
            lit(7),
            prim(Primitive::Mult),
            lit(2),
            prim(Primitive::Sub),
            prim(Primitive::PutIntNl),
            lit(-9),
            lit(2),
            prim(Primitive::Div),
            prim(Primitive::PutIntNl),
            halt(),
        ]);
        assert_eq!(output.unwrap(), "40\n-4\n");
    }

    #[test]
    fn comparisons_and_logic() {
        let output = run(vec![
            lit(1),
            lit(2),
            prim(Primitive::Lt),
            lit(0),
            prim(Primitive::Or),
            prim(Primitive::Not),
            prim(Primitive::PutIntNl),
            halt(),
        ]);
        assert_eq!(output.unwrap(), "0\n");
    }

    #[test]
    fn division_by_zero() {
        let result = run(vec![lit(1), lit(0), prim(Primitive::Div), halt()]);
        assert_eq!(result, Err(RuntimeError::DivisionByZero { pc: 2 }));
    }

    #[test]
    fn conditional_jump_pops_its_operand() {
        // 0: LOADL 0; 1: JUMPIF (0) 4; 2: LOADL 1; 3: putintnl; 4: LOADL 2; 5: putintnl; 6: HALT
        let output = run(vec![
            lit(0),
            Instruction::new(OpCode::JumpIf, Register::Cb, 0, 4),
            lit(1),
            prim(Primitive::PutIntNl),
            lit(2),
            prim(Primitive::PutIntNl),
            halt(),
        ]);
        assert_eq!(output.unwrap(), "2\n");
    }

    #[test]
    fn call_and_return_with_result() {
        // f(a, b) = a - b, called as f(10, 3): arguments pushed last-first.
        let output = run(vec![
            lit(3),
            lit(10),
            Instruction::with_d(OpCode::Call, 5),
            prim(Primitive::PutIntNl),
            halt(),
            // 5: f
            Instruction::new(OpCode::Load, Register::Lb, 1, -1),
            Instruction::new(OpCode::Load, Register::Lb, 1, -2),
            prim(Primitive::Sub),
            Instruction::new(OpCode::Return, Register::Cb, 1, 2),
        ]);
        assert_eq!(output.unwrap(), "7\n");
    }

    #[test]
    fn instance_call_sets_object_base() {
        // new object with one field = 42, then call get() on it.
        let output = run(vec![
            lit(5),
            lit(1),
            prim(Primitive::NewObj),
            Instruction::new(OpCode::Load, Register::St, 1, -1),
            lit(0),
            lit(42),
            prim(Primitive::FieldUpd),
            Instruction::with_d(OpCode::CallI, 10),
            prim(Primitive::PutIntNl),
            halt(),
            // 10: get
            Instruction::new(OpCode::LoadA, Register::Ob, 0, 0),
            lit(0),
            prim(Primitive::FieldRef),
            Instruction::new(OpCode::Return, Register::Cb, 1, 0),
        ]);
        assert_eq!(output.unwrap(), "42\n");
    }

    #[test]
    fn arrays_check_bounds_and_null() {
        let out_of_bounds = run(vec![
            lit(2),
            prim(Primitive::NewArr),
            lit(2),
            prim(Primitive::ArrayRef),
            halt(),
        ]);
        assert_eq!(
            out_of_bounds,
            Err(RuntimeError::IndexOutOfBounds { index: 2, len: 2, pc: 3 })
        );

        let null = run(vec![lit(0), prim(Primitive::ArrayLen), halt()]);
        assert_eq!(null, Err(RuntimeError::NullPointer { pc: 1 }));

        let negative = run(vec![lit(-1), prim(Primitive::NewArr), halt()]);
        assert_eq!(negative, Err(RuntimeError::NegativeArraySize { size: -1, pc: 1 }));
    }

    #[test]
    fn array_update_and_length() {
        let output = run(vec![
            lit(3),
            prim(Primitive::NewArr),
            Instruction::new(OpCode::Load, Register::St, 1, -1),
            lit(1),
            lit(9),
            prim(Primitive::ArrayUpd),
            Instruction::new(OpCode::Load, Register::St, 1, -1),
            lit(1),
            prim(Primitive::ArrayRef),
            prim(Primitive::PutIntNl),
            prim(Primitive::ArrayLen),
            prim(Primitive::PutIntNl),
            halt(),
        ]);
        assert_eq!(output.unwrap(), "9\n3\n");
    }

    #[test]
    fn step_limit() {
        let looping = program(vec![Instruction::with_d(OpCode::Jump, 0)]);
        let result = Vm::run_to_string(&looping, VmConfig::default().with_max_steps(100));
        assert_eq!(result, Err(RuntimeError::StepLimitExceeded { limit: 100 }));
    }

    #[test]
    fn unbounded_recursion_overflows() {
        let recursive = program(vec![Instruction::with_d(OpCode::Call, 0)]);
        let result = Vm::run_to_string(&recursive, VmConfig::default().with_memory_words(64));
        assert_eq!(result, Err(RuntimeError::StackOverflow { pc: 0 }));
    }

    #[test]
    fn jump_outside_code_is_invalid() {
        let result = run(vec![Instruction::with_d(OpCode::Jump, 99)]);
        assert!(matches!(result, Err(RuntimeError::InvalidInstruction { pc: 0, .. })));
    }

    #[test]
    fn stats_are_counted() {
        let code = program(vec![lit(1), lit(2), Instruction::with_d(OpCode::Pop, 2), halt()]);
        let mut out = Vec::new();
        let stats = Vm::new(&code, VmConfig::default()).run(&mut out).unwrap();
        assert_eq!(stats.steps, 4);
        assert_eq!(stats.max_stack, 2);
        assert_eq!(stats.heap_words, 0);
    }
}
