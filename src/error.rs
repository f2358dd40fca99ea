//! Error types for MessagePack encoding and decoding.

use std::io;
use std::sync::Arc;

use crate::wire::Type;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing MessagePack data.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("unexpected type: {actual} (expected {expected})")]
    TypeMismatch { actual: Type, expected: Type },

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("floating-point overflow")]
    FloatOverflow,

    #[error("invalid extension type {0}")]
    InvalidExtension(i8),

    #[error("length limit exceeded")]
    LengthLimitExceeded,

    #[error("format error: {0}")]
    Format(String),

    /// The source ended while a value was only partially consumed.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The source ended cleanly before the first byte of a new value.
    #[error("end of stream")]
    EndOfStream,

    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Wraps any displayable error raised by a caller-supplied capability.
    pub fn custom(e: impl std::fmt::Display) -> Self {
        Self::Custom(e.to_string())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Reports whether the source ended cleanly between two values.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /// Promotes a clean end of stream to an unexpected end of input.
    ///
    /// Used wherever a value is known to be incomplete, e.g. inside a
    /// container whose remaining children have not been read yet.
    pub fn unexpected_eof(self) -> Self {
        match self {
            Self::EndOfStream => Self::UnexpectedEof,
            other => other,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            _ => Self::Io(Arc::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_message() {
        let err = Error::TypeMismatch {
            actual: Type::String,
            expected: Type::Int,
        };
        assert_eq!(err.to_string(), "unexpected type: string (expected int)");
    }

    #[test]
    fn io_unexpected_eof_is_mapped() {
        let err = Error::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(err, Error::UnexpectedEof));

        let err = Error::from(io::Error::other("boom"));
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: boom");
    }

    #[test]
    fn end_of_stream_promotion() {
        assert!(Error::EndOfStream.is_end_of_stream());
        assert!(matches!(Error::EndOfStream.unexpected_eof(), Error::UnexpectedEof));
        assert!(matches!(Error::FloatOverflow.unexpected_eof(), Error::FloatOverflow));
    }
}
