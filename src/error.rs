//! Error types shared by the lexer, parser, executor and front end.

use crate::command::ExitCode;
use thiserror::Error;

/// Malformed quoting found while tokenizing. Offsets count characters from
/// the start of the input and point at the opening delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated single quote at position {0}")]
    UnterminatedSingleQuote(usize),
    #[error("unterminated double quote at position {0}")]
    UnterminatedDoubleQuote(usize),
    #[error("unterminated `${{` at position {0}")]
    UnterminatedBrace(usize),
}

impl LexError {
    /// Character offset of the offending delimiter.
    pub fn position(&self) -> usize {
        match self {
            LexError::UnterminatedSingleQuote(pos)
            | LexError::UnterminatedDoubleQuote(pos)
            | LexError::UnterminatedBrace(pos) => *pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("syntax error near unexpected token `{token}` at position {pos}")]
    UnexpectedToken { token: String, pos: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// `${...}` whose body is not a parameter name.
    #[error("${{{0}}}: bad substitution")]
    BadSubstitution(String),
}

/// Failure to start an external program. Never aborts the session: the
/// executor turns it into a conventional exit status.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("{0}: command not found")]
    NotFound(String),
    /// The OS error is part of the message rather than a `source`, so chain
    /// printers do not repeat it.
    #[error("{name}: {reason}")]
    Exec { name: String, reason: std::io::Error },
}

impl SpawnError {
    pub fn status(&self) -> ExitCode {
        match self {
            SpawnError::NotFound(_) => 127,
            SpawnError::Exec { .. } => 126,
        }
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Expansion(#[from] ExpansionError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("positional parameters are already set")]
    PositionalAlreadySeeded,
    /// Any other failure of a running command.
    #[error("{0:#}")]
    Command(anyhow::Error),
}

impl ShellError {
    /// Status of a command cycle that ended with this error.
    pub fn status(&self) -> ExitCode {
        match self {
            ShellError::Lex(_) | ShellError::Syntax(_) => 2,
            ShellError::Spawn(err) => err.status(),
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for ShellError {
    /// Recovers a [`SpawnError`] from a command failure when there is one.
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<SpawnError>() {
            Ok(spawn) => ShellError::Spawn(spawn),
            Err(err) => ShellError::Command(err),
        }
    }
}
