//! This crate contains a tree-walk interpreter for Finch, a small dynamically typed scripting
//! language with first-class functions, closures, arrays, and dictionaries.

pub mod ast;
pub mod callable;
pub mod environment;
pub mod finch;
pub mod interpreter;
pub mod object;
pub mod parser;
pub mod pretty_printers;
pub mod resolver;
pub mod scanner;
pub mod tokens;

use color_eyre::Result;
use std::{env, process};
use tracing_subscriber::{filter::LevelFilter, fmt::Layer, prelude::*, EnvFilter};

pub use self::interpreter::Interpreter;

/// Run the interpreter, taking a source file as the first CLI argument, or running the REPL if no
/// file was given.
///
/// Exit codes follow the sysexits convention: 64 for a usage error, 65 for code that failed to
/// compile, 70 for code that failed at runtime.
pub fn run_interpreter() -> Result<()> {
    color_eyre::install()?;

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry().with(
            Layer::new().with_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::WARN.into())
                    .from_env_lossy(),
            ),
        ),
    )?;

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: rfinch [script]");
        process::exit(64);
    }

    let mut interpreter = finch::FinchInterpreter::new();

    match args.get(1) {
        Some(path) => match interpreter.run_file(path) {
            Ok(()) => {}
            Err(finch::RunFileError::StaticError) => process::exit(65),
            Err(finch::RunFileError::RuntimeError) => process::exit(70),
            Err(finch::RunFileError::Io(error)) => return Err(error.into()),
        },
        None => interpreter.run_prompt()?,
    }

    Ok(())
}
