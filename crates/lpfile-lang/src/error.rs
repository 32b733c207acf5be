use std::io;

use lpfile_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unexpected character {found:?} at line {line}, column {column}")]
    Lex {
        line: usize,
        column: usize,
        found: char,
    },
    #[error("Line {line} is {length} characters long, the limit is {max}")]
    LineTooLong {
        line: usize,
        length: usize,
        max: usize,
    },
    #[error("Identifier at line {line} is {length} characters long, the limit is {max}")]
    NameTooLong {
        line: usize,
        length: usize,
        max: usize,
    },
    #[error("Unrecognized token {found} at line {line} (token {position})")]
    Tokenize {
        line: usize,
        position: usize,
        found: String,
    },
    #[error("Invalid LP file: {0}")]
    InvalidArgument(String),
    #[error("Unexpected {found} after end keyword at line {line}")]
    UnexpectedTokenAfterEnd { line: usize, found: String },
    #[error("Unexpected token: expected {expected}, found {found} at line {line}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },
    #[error("Unresolved variable reference: {0}")]
    UnresolvedVariableReference(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Stable identifier of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Lex { .. } => "LEX_ERROR",
            ParseError::LineTooLong { .. } => "LINE_TOO_LONG",
            ParseError::NameTooLong { .. } => "NAME_TOO_LONG",
            ParseError::Tokenize { .. } => "TOKENIZE_ERROR",
            ParseError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ParseError::UnexpectedTokenAfterEnd { .. } => "UNEXPECTED_TOKEN_AFTER_END",
            ParseError::UnexpectedToken { .. } => "UNEXPECTED_TOKEN",
            ParseError::UnresolvedVariableReference(_) => "UNRESOLVED_VARIABLE_REFERENCE",
            ParseError::Io(_) => "IO_ERROR",
        }
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to write LP output: {0}")]
    Sink(#[from] io::Error),
    #[error("Model is inconsistent: {0}")]
    Model(#[from] ModelError),
}

impl WriteError {
    pub fn code(&self) -> &'static str {
        match self {
            WriteError::Sink(_) => "SINK_WRITE_ERROR",
            WriteError::Model(_) => "MODEL_INCONSISTENT",
        }
    }
}
