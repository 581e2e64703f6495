//! Error types for the schema, encode, decode and connection layers.

use thiserror::Error;

use crate::frame::FrameError;
use crate::schema::FieldLength;

/// Errors raised while building a command payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The registry has no command table.
    #[error("no command specifications configured")]
    NotImplemented,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A field with no default was not supplied.
    #[error("the expected field '{field}' ({length}) was not provided")]
    MissingField {
        field: &'static str,
        length: FieldLength,
    },

    #[error("the data provided for '{field}' was not {expected} bytes long (got {found})")]
    FieldLengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// A null-terminated field value contained its own terminator.
    #[error("the data provided for '{field}' contains a zero byte")]
    InteriorNul { field: &'static str },
}

/// Errors raised while splitting a response payload into fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The registry has no response table.
    #[error("no response specifications configured")]
    NotImplemented,

    #[error("unrecognized response with id byte 0x{0:02X}")]
    UnrecognizedResponse(u8),

    /// The id byte belongs to an outbound command. Usually means the link is
    /// echoing our own frames or the module is not in API mode.
    #[error("incoming frame with id 0x{id:02X} looks like a '{command}' command frame")]
    CommandFrame { id: u8, command: &'static str },

    #[error("response frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    #[error("response frame too long: expected {expected} bytes, got {actual}")]
    FrameTooLong { expected: usize, actual: usize },
}

/// Violations of the static schema invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("response id 0x{0:02X} is declared more than once")]
    DuplicateResponseId(u8),

    #[error("command '{0}' is declared more than once")]
    DuplicateCommand(&'static str),

    #[error("field '{field}' of '{schema}' has a zero fixed length")]
    ZeroLength {
        schema: &'static str,
        field: &'static str,
    },

    /// A rest-of-frame field must be the last one.
    #[error("field '{field}' of '{schema}' consumes the rest of the frame but is not last")]
    ToEndNotLast {
        schema: &'static str,
        field: &'static str,
    },
}

/// Everything that can go wrong on a connection.
#[derive(Error, Debug)]
pub enum ConnectionError<ReadError, WriteError> {
    #[error("serial read failed: {0:?}")]
    Read(ReadError),
    #[error("serial write failed: {0:?}")]
    Write(WriteError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
