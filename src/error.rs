use thiserror::Error;

use crate::tokenizer::IfcTokenType;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Loader error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input; `offset` is a source-text byte offset when reported
    /// by the tokenizer and a tape offset when reported by the parser.
    #[error("parse error at byte {offset}: {reason}")]
    Parse { offset: u64, reason: String },

    /// String, enum or label payload longer than the 255-byte token limit
    #[error("token longer than 255 bytes at byte {offset}")]
    TokenTooLong { offset: u64 },

    /// Cursor asked for an argument index past the end of a line
    #[error("argument {index} out of range for line #{express_id}")]
    ArgumentOutOfRange { express_id: u32, index: u32 },

    /// Typed accessor found a different token tag than it expected
    #[error("expected {expected:?} token, found {found:?}")]
    WrongTag {
        expected: IfcTokenType,
        found: IfcTokenType,
    },

    /// Express ID is not present in the handle index
    #[error("no line with express ID #{0}")]
    UnknownLine(u32),

    /// Model ID is not present in the registry (or the model was closed)
    #[error("no open model with ID {0}")]
    BadHandle(u32),

    /// Write path was handed a type code the schema table cannot name
    #[error("no schema name for type code {0}")]
    UnknownType(u16),
}

impl Error {
    pub(crate) fn parse(offset: u64, reason: impl Into<String>) -> Self {
        Error::Parse {
            offset,
            reason: reason.into(),
        }
    }
}
