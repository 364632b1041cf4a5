//! Compilation unit API.
//!
//! A [`Unit`] takes MiniJava source, runs it through the parser and the
//! compiler passes, and executes the resulting program.
//!
//! # Example
//!
//! ```
//! use minijava::Unit;
//!
//! let mut unit = Unit::new();
//! unit.add_source("Main.java", r#"
//!     class Main {
//!         public static void main(String[] args) {
//!             int[] x = new int[3];
//!             x[0] = 5;
//!             System.out.println(x[0]);
//!         }
//!     }
//! "#)?;
//!
//! unit.build()?;
//! assert_eq!(unit.run_to_string()?, "5\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Write;

use log::{debug, info};
use minijava_compiler::{Compiler, Program, Stage};
use minijava_core::{CompilationError, MiniJavaError, ParseErrors, RuntimeError};
use minijava_parser::{Package, Parser};

use crate::vm::{ExecutionStats, Vm, VmConfig};

/// How far to take a unit, and how to run it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitOptions {
    /// Last compiler pass to run. Anything before code generation leaves the
    /// unit built but without a program.
    pub stop_after: Stage,
    pub vm: VmConfig,
}

impl UnitOptions {
    pub fn with_stop_after(mut self, stage: Stage) -> Self {
        self.stop_after = stage;
        self
    }

    pub fn with_vm(mut self, vm: VmConfig) -> Self {
        self.vm = vm;
        self
    }
}

/// A MiniJava program on its way from source to execution.
///
/// 1. Create a unit with `Unit::new()` or `Unit::with_options()`
/// 2. Add the source file with `add_source()`
/// 3. Build it with `build()`
/// 4. Execute it with `run()`
#[derive(Debug, Default)]
pub struct Unit {
    options: UnitOptions,

    /// Source files to compile (filename, source).
    sources: Vec<(String, String)>,

    /// The checked tree, kept after a successful build.
    package: Option<Package>,

    program: Option<Program>,

    /// The last compiler pass that ran.
    last_stage: Option<Stage>,

    is_built: bool,
}

impl Unit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: UnitOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &UnitOptions {
        &self.options
    }

    /// Add a source file to the unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit has already been built, or a file of the
    /// same name was already added.
    pub fn add_source(
        &mut self,
        filename: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), UnitError> {
        if self.is_built {
            return Err(UnitError::AlreadyBuilt);
        }

        let filename = filename.into();
        if self.sources.iter().any(|(name, _)| *name == filename) {
            return Err(UnitError::DuplicateFile(filename));
        }
        self.sources.push((filename, source.into()));
        Ok(())
    }

    /// Parse and compile the source.
    ///
    /// # Errors
    ///
    /// Returns every parse error, or every error from the compiler pass that
    /// failed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&mut self) -> Result<(), BuildError> {
        if self.is_built {
            return Err(BuildError::AlreadyBuilt);
        }

        let (filename, source) = match self.sources.as_slice() {
            [] => return Err(BuildError::NoSources),
            [single] => single,
            _ => return Err(BuildError::MultiFileNotSupported),
        };

        info!("building '{filename}'");
        let mut package = {
            #[cfg(feature = "profiling")]
            profiling::scope!("parse");
            Parser::parse(source).map_err(|errors| BuildError::ParseErrors {
                file: filename.clone(),
                errors,
            })?
        };

        let result = {
            #[cfg(feature = "profiling")]
            profiling::scope!("compile");
            Compiler::compile_until(&mut package, self.options.stop_after)
        };
        if !result.is_success() {
            return Err(BuildError::CompilationErrors {
                file: filename.clone(),
                stage: result.last_stage,
                errors: result.diagnostics.into_errors(),
            });
        }

        debug!(
            "built '{filename}' through {}: {} instructions",
            result.last_stage,
            result.program.as_ref().map_or(0, Program::len)
        );
        self.program = result.program;
        self.last_stage = Some(result.last_stage);
        self.package = Some(package);
        self.is_built = true;
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.is_built
    }

    /// The generated program (available after a build through code generation).
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// The bound and checked tree (available after build).
    pub fn package(&self) -> Option<&Package> {
        self.package.as_ref()
    }

    pub fn last_stage(&self) -> Option<Stage> {
        self.last_stage
    }

    /// Disassembly of the generated program.
    pub fn disassemble(&self) -> Option<String> {
        self.program.as_ref().map(Program::disassemble)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Reset the unit so it can take a different source.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.package = None;
        self.program = None;
        self.last_stage = None;
        self.is_built = false;
    }

    /// Execute the program, writing its output to `out`.
    pub fn run(&self, out: &mut impl Write) -> Result<ExecutionStats, ExecutionError> {
        if !self.is_built {
            return Err(ExecutionError::NotBuilt);
        }
        let program = self.program.as_ref().ok_or(ExecutionError::NoProgram {
            stage: self.options.stop_after,
        })?;
        Ok(Vm::new(program, self.options.vm).run(out)?)
    }

    /// Execute the program and collect its output.
    pub fn run_to_string(&self) -> Result<String, ExecutionError> {
        let mut out = Vec::new();
        self.run(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Errors that can occur when adding sources to the unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("Unit has already been built. Use clear() to start over.")]
    AlreadyBuilt,

    #[error("File '{0}' was already added to the unit")]
    DuplicateFile(String),
}

/// Errors that can occur during unit building.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No sources added to unit")]
    NoSources,

    #[error("Unit has already been built")]
    AlreadyBuilt,

    #[error("Parse errors in '{file}':\n{errors}")]
    ParseErrors { file: String, errors: ParseErrors },

    #[error("{} error(s) in '{file}' during {stage}", .errors.len())]
    CompilationErrors {
        file: String,
        stage: Stage,
        errors: Vec<CompilationError>,
    },

    /// A MiniJava program is a single file.
    #[error("Multi-file compilation is not supported")]
    MultiFileNotSupported,
}

impl BuildError {
    /// Convert to a vector of `MiniJavaError`.
    ///
    /// Variants without underlying errors give an empty vector.
    pub fn into_errors(self) -> Vec<MiniJavaError> {
        match self {
            BuildError::ParseErrors { errors, .. } => vec![MiniJavaError::Parse(errors)],
            BuildError::CompilationErrors { errors, .. } => vec![MiniJavaError::Compilation(errors)],
            _ => Vec::new(),
        }
    }

    /// The compilation errors, if compilation is what failed.
    pub fn compilation_errors(&self) -> &[CompilationError] {
        match self {
            BuildError::CompilationErrors { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Errors that can occur when running a unit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Unit has not been built")]
    NotBuilt,

    #[error("No program to run: the build stopped after {stage}")]
    NoProgram { stage: Stage },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
