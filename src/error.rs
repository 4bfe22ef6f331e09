//! Centralised error hierarchy for the Nox interpreter.
//!
//! All subsystems (scanner, parser, resolver, evaluator, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables
//! a uniform `Result<T>` alias throughout the crate while preserving the
//! diagnostic detail each stage needs.
//!
//! Non-local control transfers (`return`, `break`, `continue`) are *not*
//! errors; they travel through the evaluator as [`Signal`] values on the same
//! `Result` channel so that each frame can intercept exactly the signals it
//! owns and let everything else unwind past it.
//!
//! The module does not print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;
use crate::value::Value;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static-analysis failure (scope misuse, illegal placement).
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error, anchored to the offending token.
    #[error("[line {line}] RuntimeError at '{lexeme}': {message}")]
    Runtime {
        message: String,
        line: usize,
        lexeme: String,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl NoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        NoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        NoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        NoxError::Resolve { message, line }
    }

    /// Helper constructor for the **evaluator**, anchored at `token`.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        NoxError::Runtime {
            message: msg.into(),
            line: token.line,
            lexeme: token.lexeme.clone(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, NoxError>;

/// Internal unwinding channel of the evaluator.
///
/// `Error` carries a genuine failure; the other three are structured
/// transfers.  Function call frames intercept `Return`, loop frames intercept
/// `Break`/`Continue`, and the safe operator `?expr` converts a runtime
/// `Error` into nil.  Nothing else may swallow a signal.
#[derive(Debug)]
pub enum Signal {
    Error(NoxError),
    Return(Value),
    Break,
    Continue,
}

impl From<NoxError> for Signal {
    fn from(err: NoxError) -> Self {
        Signal::Error(err)
    }
}

impl Signal {
    /// Helper for raising a runtime error inside the evaluator.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        Signal::Error(NoxError::runtime(token, msg))
    }

    /// Collapse a signal back into an error at a boundary that should never
    /// see structured transfers (the resolver has already rejected stray
    /// `return`/`break`/`continue`).
    pub fn into_error(self) -> NoxError {
        match self {
            Signal::Error(err) => err,
            Signal::Return(_) => NoxError::Resolve {
                message: "Cannot return from top-level code.".to_string(),
                line: 0,
            },
            Signal::Break | Signal::Continue => NoxError::Resolve {
                message: "Loop control outside of a loop.".to_string(),
                line: 0,
            },
        }
    }
}

/// Evaluator-internal `Result` alias carrying the unwinding channel.
pub type Exec<T> = std::result::Result<T, Signal>;
