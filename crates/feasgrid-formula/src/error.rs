//! Formula error types

use feasgrid_core::CellAddress;
use std::fmt;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Malformed cell address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed range, or a range used where one value is expected
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// A cell's formula refers back to itself
    #[error("Circular reference detected at {0}")]
    CircularReference(CellAddress),

    /// MIN or MAX over no values
    #[error("{0} of an empty range")]
    EmptyRange(&'static str),

    /// Reference chain deeper than the evaluation limit
    #[error("Reference chain deeper than {0} cells")]
    DepthLimit(usize),
}

impl FormulaError {
    /// The reason code shown for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            FormulaError::InvalidRange(_) => ErrorKind::InvalidRange,
            FormulaError::Parse(_)
            | FormulaError::UnknownFunction(_)
            | FormulaError::ArgumentCount { .. } => ErrorKind::ParseError,
            FormulaError::DivisionByZero => ErrorKind::DivisionByZero,
            FormulaError::CircularReference(_) => ErrorKind::CircularReference,
            FormulaError::EmptyRange(_) => ErrorKind::EmptyRange,
            FormulaError::DepthLimit(_) => ErrorKind::DepthLimit,
        }
    }
}

impl From<feasgrid_core::Error> for FormulaError {
    fn from(err: feasgrid_core::Error) -> Self {
        match err {
            feasgrid_core::Error::InvalidAddress(msg) => FormulaError::InvalidAddress(msg),
            feasgrid_core::Error::InvalidRange(msg) => FormulaError::InvalidRange(msg),
        }
    }
}

/// Reason code carried by an error result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAddress,
    InvalidRange,
    ParseError,
    DivisionByZero,
    CircularReference,
    EmptyRange,
    DepthLimit,
}

impl ErrorKind {
    /// Stable code string for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAddress => "InvalidAddress",
            ErrorKind::InvalidRange => "InvalidRange",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::CircularReference => "CircularReference",
            ErrorKind::EmptyRange => "EmptyRange",
            ErrorKind::DepthLimit => "DepthLimit",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
