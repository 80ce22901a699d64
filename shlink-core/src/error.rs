//! Error types for Shell Link operations

use std::io::ErrorKind;

/// Errors that can occur while reading, writing or building Shell Link records
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    /// Header size field is not 76
    #[error("Invalid header size: expected 76, got {0}")]
    BadHeaderSize(u32),

    /// Header CLSID does not identify a Shell Link
    #[error("Invalid link CLSID: {0:02x?}")]
    BadClsid([u8; 16]),

    /// Stream ended before a field or block was complete
    #[error("Truncated record while reading {context}")]
    Truncated {
        /// What was being read when the stream ran out.
        context: String,
    },

    /// A block's own size prefix is inconsistent with its layout
    #[error("Invalid record structure: {0}")]
    InvalidStructure(String),

    /// A string does not fit the u16 character count prefix
    #[error("String of {0} code units exceeds the 65535 limit")]
    StringTooLong(usize),

    /// Identifier string could not be decoded
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Caller supplied an argument that violates a precondition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error during read/write
    #[error("IO error: {0}")]
    Io(String),
}

impl LinkError {
    /// True when the error means the input ran out mid-record
    pub fn is_truncation(&self) -> bool {
        matches!(self, LinkError::Truncated { .. })
    }

    pub(crate) fn truncated(context: &str) -> Self {
        LinkError::Truncated {
            context: context.to_string(),
        }
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == ErrorKind::UnexpectedEof {
            LinkError::truncated("stream")
        } else {
            LinkError::Io(err.to_string())
        }
    }
}

/// Attach the name of the field being read to an end-of-stream error
pub(crate) trait ReadContext<T> {
    fn context(self, what: &str) -> Result<T, LinkError>;
}

impl<T> ReadContext<T> for std::io::Result<T> {
    fn context(self, what: &str) -> Result<T, LinkError> {
        self.map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => LinkError::truncated(what),
            _ => LinkError::Io(err.to_string()),
        })
    }
}

impl<T> ReadContext<T> for Result<T, LinkError> {
    fn context(self, what: &str) -> Result<T, LinkError> {
        self.map_err(|err| match err {
            LinkError::Truncated { .. } => LinkError::truncated(what),
            other => other,
        })
    }
}
