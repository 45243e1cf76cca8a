//! Error and internal status types for the interpreter.

use std::fmt;

use crate::Value;

/// Status codes returned by the driver's public entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsError {
    /// The arena's byte budget is exhausted.
    NoMem,
    /// A token, expression, or statement didn't parse.
    Syntax,
    /// A referenced name has no symbol table entry.
    UnknownSym,
    /// A builtin or user procedure call passed the wrong argument count.
    BadArgs,
    /// A `func` definition declared more formal parameters than
    /// [`crate::MAX_BUILTIN_PARAMS`] allows.
    TooManyArgs,
}

impl fmt::Display for TsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsError::NoMem => write!(f, "arena exhausted"),
            TsError::Syntax => write!(f, "syntax error"),
            TsError::UnknownSym => write!(f, "unknown symbol"),
            TsError::BadArgs => write!(f, "wrong number of arguments"),
            TsError::TooManyArgs => write!(f, "too many formal arguments"),
        }
    }
}

impl std::error::Error for TsError {}

/// Internal result of evaluating one statement.
///
/// `Else` signals "the condition was false and nothing ran" from the
/// shared if/while condition-and-body helper up to the `while` loop that
/// watches for it; it must be consumed there and never reach a statement
/// dispatcher above it. `Return` carries a `return` statement's value up
/// through however many nested scopes separate it from the `Interp::run`
/// call (or user-procedure call) that should receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Ok,
    Else,
    Return(Value),
}
