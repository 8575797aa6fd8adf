use thiserror::Error;

use common::ExitCode;

/// The error a command reports back to its caller.
///
/// It's rendered as `<command>: <msg>` on the caller's stderr, an empty message is not printed at
/// all (used by commands like `compare` that only communicate through their status).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{msg}")]
pub(crate) struct CommandError {
    pub(crate) code: ExitCode,
    pub(crate) msg: String,
}

impl CommandError {
    pub(crate) fn new(code: ExitCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    pub(crate) fn silent(code: ExitCode) -> Self {
        Self::new(code, "")
    }

    /// Generic failure, parse errors and unmet preconditions
    pub(crate) fn failed(msg: impl Into<String>) -> Self {
        Self::new(ExitCode::Error, msg)
    }

    /// No such object, no such client, read-only attributes and similar
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::new(ExitCode::InvalidArgument, msg)
    }

    pub(crate) fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ExitCode::Forbidden, msg)
    }

    pub(crate) fn need_more_args() -> Self {
        Self::new(ExitCode::NeedMoreArgs, "not enough arguments")
    }
}

pub(crate) type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid rectangle \"{rect}\", expected WxH+X+Y")]
pub(crate) struct ParseRectError {
    pub(crate) rect: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color \"{color}\"")]
pub(crate) struct ParseColorError {
    pub(crate) color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid decimal \"{decimal}\"")]
pub(crate) struct ParseDecimalError {
    pub(crate) decimal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ParseComboError {
    #[error("Unknown modifier \"{0}\"")]
    Modifier(String),
    #[error("Unknown KeySym \"{0}\"")]
    KeySym(String),
    #[error("Unknown mouse button \"{0}\"")]
    Button(String),
    #[error("Empty key combination")]
    Empty,
}

/// A syntax error in a serialized layout, `offset` is the byte position of the problem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax error at {offset}: {msg}")]
pub(crate) struct LayoutError {
    pub(crate) offset: usize,
    pub(crate) msg: String,
}

impl LayoutError {
    pub(crate) fn new(offset: usize, msg: impl Into<String>) -> Self {
        Self {
            offset,
            msg: msg.into(),
        }
    }
}
