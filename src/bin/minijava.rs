// src/bin/minijava.rs

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use minijava::{BuildError, Stage, Unit, UnitOptions, VmConfig};

/// MiniJava compiler and virtual machine
#[derive(Parser)]
#[command(name = "minijava")]
#[command(version = "0.1.0")]
#[command(about = "Compile and run MiniJava programs", long_about = None)]
struct Cli {
    /// Path to the .java file to compile
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Stop after this compiler pass
    #[arg(long, value_enum, default_value_t = StopAfter::Codegen)]
    stop_after: StopAfter,

    /// Print the generated instructions
    #[arg(short, long)]
    disassemble: bool,

    /// Compile only; do not run the program
    #[arg(long)]
    no_run: bool,

    /// Data store size in words
    #[arg(long, value_name = "WORDS")]
    memory: Option<usize>,

    /// Abort the program after this many instructions
    #[arg(long, value_name = "STEPS")]
    max_steps: Option<u64>,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StopAfter {
    Identification,
    Typecheck,
    Codegen,
}

impl From<StopAfter> for Stage {
    fn from(stop: StopAfter) -> Self {
        match stop {
            StopAfter::Identification => Stage::Identification,
            StopAfter::Typecheck => Stage::TypeChecking,
            StopAfter::Codegen => Stage::CodeGeneration,
        }
    }
}

impl Cli {
    fn options(&self) -> UnitOptions {
        let mut vm = VmConfig::default();
        if let Some(words) = self.memory {
            vm = vm.with_memory_words(words);
        }
        if let Some(steps) = self.max_steps {
            vm = vm.with_max_steps(steps);
        }
        UnitOptions::default()
            .with_stop_after(self.stop_after.into())
            .with_vm(vm)
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = simple_logger::SimpleLogger::new()
        .with_level(cli.log_level())
        .env()
        .init()
    {
        eprintln!("warning: logger unavailable: {err}");
    }

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", cli.file.display());
            return ExitCode::from(2);
        }
    };

    let mut unit = Unit::with_options(cli.options());
    if let Err(err) = unit.add_source(cli.file.display().to_string(), source) {
        eprintln!("error: {err}");
        return ExitCode::from(2);
    }

    if let Err(err) = unit.build() {
        report_build_error(&err);
        return ExitCode::from(4);
    }

    if cli.disassemble
        && let Some(listing) = unit.disassemble()
    {
        print!("{listing}");
    }

    if cli.no_run || unit.program().is_none() {
        return ExitCode::SUCCESS;
    }

    let stdout = io::stdout();
    match unit.run(&mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("runtime error: {err}");
            ExitCode::from(1)
        }
    }
}

fn report_build_error(err: &BuildError) {
    match err {
        BuildError::CompilationErrors { file, errors, .. } => {
            for error in errors {
                eprintln!("{file}: {error}");
            }
            eprintln!("{err}");
        }
        other => eprintln!("{other}"),
    }
}
