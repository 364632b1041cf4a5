//! MiniJava Compiler
//!
//! Lowers a parsed [`Package`] to a [`Program`] for the stack machine in three
//! passes over the tree.
//!
//! ## Architecture
//!
//! - **Identification**: binds every name to its declaration and enforces
//!   scoping, static-context and visibility rules
//! - **Type checking**: computes expression types and checks return reachability
//! - **Code generation**: assigns storage offsets and emits instructions,
//!   patching calls to routines emitted later
//!
//! Each pass reports into a shared [`Diagnostics`]; the [`Compiler`] driver
//! stops after the first pass that recorded an error.
//!
//! ## Modules
//!
//! - [`bytecode`]: Instruction set (OpCode, Register, Primitive, Program)
//! - [`codegen`]: Code generation pass and storage layout
//! - [`emit`]: Low-level instruction emitter with call patching
//! - [`identification`]: Name binding pass
//! - [`return_checker`]: Return reachability tracking
//! - [`scope`]: Scoped symbol table used by identification
//! - [`type_check`]: Type checking pass

pub mod bytecode;
pub mod codegen;
pub mod emit;
pub mod identification;
pub mod return_checker;
pub mod scope;
pub mod type_check;

use std::fmt;

use log::{debug, info};

pub use bytecode::{Instruction, OpCode, Primitive, Program, Register};
pub use codegen::CodeGenerator;
pub use emit::{BytecodeEmitter, JumpLabel};
pub use identification::Identification;
pub use return_checker::ReturnTracker;
pub use scope::SymbolTable;
pub use type_check::TypeChecker;

// Re-export from core for convenience
pub use minijava_core::{CompilationError, Diagnostics};

use minijava_parser::ast::Package;

/// A compiler pass, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    Identification,
    TypeChecking,
    #[default]
    CodeGeneration,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Identification => "identification",
            Stage::TypeChecking => "type checking",
            Stage::CodeGeneration => "code generation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of compilation.
#[derive(Debug)]
pub struct CompilationResult {
    /// The program, present when code generation ran and succeeded.
    pub program: Option<Program>,
    /// Errors from every pass that ran.
    pub diagnostics: Diagnostics,
    /// The last pass that ran.
    pub last_stage: Stage,
}

impl CompilationResult {
    /// Check if compilation succeeded (no errors).
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// The main compiler entry point.
pub struct Compiler;

impl Compiler {
    /// Run all three passes.
    pub fn compile(package: &mut Package) -> CompilationResult {
        Self::compile_until(package, Stage::CodeGeneration)
    }

    /// Run the passes up to and including `last`.
    ///
    /// Later passes rely on what earlier ones establish, so the pipeline also
    /// stops after any pass that reported an error.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_until(package: &mut Package, last: Stage) -> CompilationResult {
        let mut diagnostics = Diagnostics::new();

        info!("{}", Stage::Identification);
        Identification::run(package, &mut diagnostics);
        if let Some(result) = Self::gate(Stage::Identification, last, &mut diagnostics) {
            return result;
        }

        info!("{}", Stage::TypeChecking);
        TypeChecker::run(package, &mut diagnostics);
        if let Some(result) = Self::gate(Stage::TypeChecking, last, &mut diagnostics) {
            return result;
        }

        info!("{}", Stage::CodeGeneration);
        let program = CodeGenerator::run(package, &mut diagnostics);
        CompilationResult {
            program: program.filter(|_| !diagnostics.has_errors()),
            diagnostics,
            last_stage: Stage::CodeGeneration,
        }
    }

    /// Stop after `stage` if it failed or was the last one requested.
    fn gate(stage: Stage, last: Stage, diagnostics: &mut Diagnostics) -> Option<CompilationResult> {
        if diagnostics.has_errors() {
            debug!("{stage}: {} error(s), stopping", diagnostics.error_count());
        } else if stage < last {
            return None;
        }
        Some(CompilationResult {
            program: None,
            diagnostics: std::mem::take(diagnostics),
            last_stage: stage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijava_core::ErrorCategory;
    use minijava_parser::Parser;

    fn parse(source: &str) -> Package {
        Parser::parse(source).unwrap_or_else(|errors| panic!("parse failed: {errors}"))
    }

    #[test]
    fn compiles_minimal_program() {
        let mut package = parse("class Main { public static void main(String[] args) { } }");
        let result = Compiler::compile(&mut package);
        assert!(result.is_success(), "{}", result.diagnostics);
        assert_eq!(result.last_stage, Stage::CodeGeneration);
        assert!(result.program.is_some_and(|program| !program.is_empty()));
    }

    #[test]
    fn identification_errors_skip_type_checking() {
        let mut package = parse(
            "class Main {
                public static void main(String[] args) { }
                void foo() { }
                int foo() { return true; }
            }",
        );
        let result = Compiler::compile(&mut package);
        assert!(!result.is_success());
        assert_eq!(result.last_stage, Stage::Identification);
        assert!(result.program.is_none());
        // The bad return would be a type error, but that pass never ran.
        assert!(
            result
                .diagnostics
                .iter()
                .all(|error| error.category() != ErrorCategory::Type)
        );
    }

    #[test]
    fn type_errors_skip_code_generation() {
        let mut package = parse(
            "class Main { public static void main(String[] args) { int x = true; } }",
        );
        let result = Compiler::compile(&mut package);
        assert_eq!(result.last_stage, Stage::TypeChecking);
        assert!(result.program.is_none());
        assert_eq!(result.diagnostics.error_count(), 1);
    }

    #[test]
    fn stops_at_requested_stage() {
        let mut package = parse("class Main { public static void main(String[] args) { } }");
        let result = Compiler::compile_until(&mut package, Stage::TypeChecking);
        assert!(result.is_success());
        assert_eq!(result.last_stage, Stage::TypeChecking);
        assert!(result.program.is_none());
    }

    #[test]
    fn missing_main_is_reported() {
        let mut package = parse("class A { int x; }");
        let result = Compiler::compile(&mut package);
        assert!(!result.is_success());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|error| matches!(error, CompilationError::MissingMain))
        );
    }
}
