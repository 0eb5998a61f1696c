//! Codec error types.

use cds_proto::ProtoError;
use thiserror::Error;

/// Errors from the AEAD codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// An address did not parse as a signed 64-bit integer.
    ///
    /// Only the position is reported; address book contents stay out of
    /// error messages and logs.
    #[error("address at index {index} is not a 64-bit integer")]
    InvalidAddress {
        /// Position of the offending address in the input.
        index: usize,
    },

    /// Address count does not fit the request's 32-bit counter.
    #[error("too many addresses: {0}")]
    TooManyAddresses(usize),

    /// Decrypted address buffer is not a whole number of addresses.
    #[error("address plaintext length {0} is not a multiple of 8")]
    TruncatedPlaintext(usize),

    /// Key material had the wrong length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Required key length.
        expected: usize,
        /// Supplied key length.
        actual: usize,
    },

    /// The AEAD primitive refused to seal the payload.
    #[error("encryption failed")]
    Encryption,

    /// Tag verification failed.
    ///
    /// Deliberately carries no detail: a wrong key and corrupted data look
    /// the same.
    #[error("authentication failed")]
    Authentication,

    /// Wire value could not be assembled.
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
}

impl CodecError {
    /// Returns true if the failure came from tag verification.
    ///
    /// The session keys involved must be discarded, not retried.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}
