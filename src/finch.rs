//! This module acts as a top-level entrypoint to evaluating Finch code.

use crate::{
    interpreter::{Interpreter, RuntimeError},
    parser::Parser,
    pretty_printers::ParenPrinter,
    resolver::{ResolveError, Resolver},
    scanner::Scanner,
    tokens::{Token, TokenType},
};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::{
    fs, io,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};
use thiserror::Error;
use tracing::{debug, trace};

/// Have we encountered at least one error before runtime?
static HAD_NON_RUNTIME_ERROR: AtomicBool = AtomicBool::new(false);

/// Have we encountered at least one error at runtime?
static HAD_RUNTIME_ERROR: AtomicBool = AtomicBool::new(false);

/// The Finch interpreter.
///
/// This drives the whole pipeline: scan, parse, resolve, interpret. Each stage aborts the run if
/// an earlier one reported an error. The interpreter itself lives for the whole session, so
/// global bindings persist across REPL inputs.
#[derive(Debug)]
pub struct FinchInterpreter {
    /// The core interpreter to run code with.
    interpreter: Interpreter,
}

impl Default for FinchInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// An error that can be returned from [`FinchInterpreter::run_file`].
#[derive(Debug, Error)]
pub enum RunFileError {
    /// The code had a scanning, parsing, or resolution error.
    #[error("An error occured while compiling the Finch code")]
    StaticError,

    /// The code had a runtime error.
    #[error("An error occured while running the Finch code")]
    RuntimeError,

    /// A standard I/O error.
    #[error("I/O error: `{0:?}`")]
    Io(#[from] io::Error),
}

/// An error that can be returned from [`FinchInterpreter::run_prompt`].
#[derive(Debug, Error)]
pub enum PromptError {
    /// An error from `rustyline`.
    #[error("rustyline error: `{0:?}`")]
    Readline(#[from] ReadlineError),

    /// A standard I/O error.
    #[error("I/O error: `{0:?}`")]
    Io(#[from] io::Error),
}

impl FinchInterpreter {
    /// Create a new interpreter.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// Read the file and run the contents.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<(), RunFileError> {
        let code = fs::read_to_string(path)?;
        self.run_code(&code);

        if HAD_NON_RUNTIME_ERROR.load(Ordering::Relaxed) {
            Err(RunFileError::StaticError)
        } else if HAD_RUNTIME_ERROR.load(Ordering::Relaxed) {
            Err(RunFileError::RuntimeError)
        } else {
            Ok(())
        }
    }

    /// Read code from an interactive prompt and run it.
    ///
    /// The error flags are cleared between lines, so a typo doesn't poison the session.
    pub fn run_prompt(&mut self) -> Result<(), PromptError> {
        let mut prompt = DefaultEditor::new()?;

        let history_file =
            home::home_dir().map(|home| home.join(".config").join("rfinch").join(".history"));
        if let Some(history_file) = &history_file {
            if !history_file.exists() {
                if let Some(parent) = history_file.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::File::create(history_file)?;
            }
            prompt.load_history(&history_file)?;
        }

        loop {
            match prompt.readline("> ") {
                Ok(mut line) => {
                    prompt.add_history_entry(&line)?;
                    if let Some(history_file) = &history_file {
                        prompt.save_history(history_file)?;
                    }
                    line.push('\n');

                    self.run_code(&line);
                }
                Err(ReadlineError::Eof | ReadlineError::Interrupted) => return Ok(()),
                Err(ReadlineError::Io(e)) => return Err(e)?,
                Err(error) => panic!("Unknown error: `{error:?}`"),
            }
            HAD_NON_RUNTIME_ERROR.store(false, Ordering::Relaxed);
            HAD_RUNTIME_ERROR.store(false, Ordering::Relaxed);
        }
    }

    /// Run the given Finch code.
    fn run_code(&mut self, code: &str) {
        debug!("Running code: ```finch\n{}```", code.trim_start());

        let tokens = Scanner::scan_tokens(code);
        trace!(?tokens);

        let stmts = Parser::parse(tokens);
        trace!(parens = %ParenPrinter::print_stmts(&stmts));

        if HAD_NON_RUNTIME_ERROR.load(Ordering::Relaxed) {
            return;
        }

        let (locals, resolve_errors) = Resolver::resolve(&stmts);
        trace!(?locals);

        for error in &resolve_errors {
            report_resolve_error(error);
        }
        if HAD_NON_RUNTIME_ERROR.load(Ordering::Relaxed) {
            return;
        }

        if let Err(error) = self.interpreter.interpret(&stmts, locals) {
            report_runtime_error(&error);
        }
    }
}

/// Report an error at the given line with the given location text and message.
fn report(line: usize, location: &str, message: &str) {
    eprintln!("[line {line}] Error{location}: {message}");
    HAD_NON_RUNTIME_ERROR.store(true, Ordering::Relaxed);
}

/// Report an error from the scanner.
pub fn report_scan_error(line: usize, message: &str) {
    report(line, "", message);
}

/// Report an error at the given token with the given message.
pub fn report_token_error(token: &Token<'_>, message: &str) {
    if token.token_type == TokenType::Eof {
        report(token.line, " at end", message);
    } else {
        report(token.line, &format!(" at '{}'", token.lexeme), message);
    }
}

/// Report a static error from the resolver.
pub fn report_resolve_error(error: &ResolveError) {
    report(error.line, &format!(" at '{}'", error.lexeme), &error.message);
}

/// Report an error at runtime.
pub fn report_runtime_error(error: &RuntimeError) {
    eprintln!("{}\n[line {}]", error.message, error.line);
    HAD_RUNTIME_ERROR.store(true, Ordering::Relaxed);
}
