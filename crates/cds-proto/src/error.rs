//! Protocol decoding errors.

use thiserror::Error;

/// Errors raised while building or decoding wire values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// A fixed-length field had the wrong length.
    #[error("invalid {field} length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Name of the field.
        field: &'static str,
        /// Required length in bytes.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Raw quote is shorter than its fixed header.
    #[error("quote too short: need at least {needed} bytes, got {actual}")]
    QuoteTooShort {
        /// Minimum number of bytes required.
        needed: usize,
        /// Number of bytes supplied.
        actual: usize,
    },

    /// Quote header carries a version this client does not understand.
    #[error("unknown quote version: {0}")]
    UnknownQuoteVersion(u16),

    /// Quote signature type is neither linkable nor unlinkable.
    #[error("unknown quote sign type: {0}")]
    UnknownSignType(u16),

    /// A reserved region of the quote was not zero.
    #[error("quote reserved field {0} is not zero")]
    NonZeroReserved(&'static str),

    /// Attribute flags are unknown or miss a required bit.
    #[error("invalid quote attribute flags: {flags:#018x}")]
    InvalidFlags {
        /// The raw flags value.
        flags: u64,
    },

    /// Declared signature length disagrees with the bytes present.
    #[error("quote signature length mismatch: declared {declared}, present {present}")]
    SignatureLength {
        /// Length declared in the quote.
        declared: usize,
        /// Bytes actually following the length field.
        present: usize,
    },

    /// Report body is not valid JSON or misses a required field.
    #[error("malformed report json: {0}")]
    MalformedJson(String),

    /// Report quote body is not valid base64.
    #[error("malformed report quote body: {0}")]
    MalformedQuoteBody(String),
}
