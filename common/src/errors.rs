use std::{io, string::FromUtf8Error};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Message is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("Invalid argument count: {0:?}")]
    BadCount(String),
    #[error("Invalid exit status: {0:?}")]
    BadStatus(String),
    #[error("Unknown message kind: {0:#x}")]
    UnknownKind(u8),
    #[error("Connection closed in the middle of a message")]
    UnexpectedEof,
}
