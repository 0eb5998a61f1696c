//! Trust layer error types.
//!
//! Every failure here is terminal for the attempt that produced it. Callers
//! may restart attestation with fresh keys, never retry with the same key
//! material or nonce.

use cds_crypto::CodecError;
use cds_proto::ProtoError;
use thiserror::Error;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed caller input or configuration.
    Format,
    /// AEAD tag verification or request id echo failed.
    Authentication,
    /// Quote report data, measurement or debug flag check failed.
    UnauthenticatedQuote,
    /// Authority certificate, signature, correspondence, status or freshness
    /// check failed.
    Signature,
    /// The environment could not supply entropy.
    Environment,
}

/// Quote verification failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// Report data does not start with the expected server public key.
    #[error("unauthenticated report data")]
    ReportDataMismatch,

    /// Code measurement is not the allow-listed one.
    #[error("wrong code measurement: {measurement}")]
    MeasurementMismatch {
        /// Measurement found in the quote, hex.
        measurement: String,
    },

    /// Debug flag disagrees with the configured policy.
    #[error(
        "unexpected debug/production quote flag: expected debug={expected_debug}, \
         got debug={actual_debug}"
    )]
    DebugFlagMismatch {
        /// Whether policy expects a debug quote.
        expected_debug: bool,
        /// Whether the quote is a debug quote.
        actual_debug: bool,
    },

    /// Quote or expected values could not be decoded.
    #[error("malformed quote: {0}")]
    Malformed(String),
}

impl From<ProtoError> for QuoteError {
    fn from(err: ProtoError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Signed report verification failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Certificate chain could not be parsed, built or trusted.
    #[error("certificate chain rejected: {0}")]
    Chain(String),

    /// Signature does not verify under the leaf certificate key.
    #[error("report signature does not verify")]
    BadSignature,

    /// Report body is not a valid report.
    #[error("malformed signed report: {0}")]
    MalformedReport(String),

    /// Report was issued for a different quote.
    #[error("signed report does not correspond to the received quote")]
    QuoteMismatch,

    /// Report status is not allow-listed.
    #[error("unacceptable quote status: {0}")]
    Status(String),

    /// Report timestamp could not be parsed.
    #[error("invalid report timestamp: {0}")]
    InvalidTimestamp(String),

    /// Report is older than the freshness window.
    #[error("signature expired: issued {timestamp}")]
    Expired {
        /// Report timestamp as received.
        timestamp: String,
    },
}

impl From<ProtoError> for SignatureError {
    fn from(err: ProtoError) -> Self {
        Self::MalformedReport(err.to_string())
    }
}

/// Trust configuration could not be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Trust store input is not a usable set of root certificates.
    #[error("invalid trust store: {0}")]
    InvalidTrustStore(String),

    /// Trust store holds no roots; nothing could ever verify.
    #[error("trust store is empty")]
    EmptyTrustStore,
}

/// Errors from trust layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrustError {
    /// Request encoding or payload decryption failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Quote was not accepted.
    #[error("unauthenticated quote: {0}")]
    Quote(#[from] QuoteError),

    /// Signed report was not accepted.
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Trust configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Enclave echoed a request id other than the one this session sent.
    #[error("request id echo does not match")]
    RequestIdMismatch,

    /// Entropy source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),
}

impl TrustError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Codec(e) if e.is_authentication_failure() => ErrorKind::Authentication,
            Self::Codec(_) | Self::Config(_) => ErrorKind::Format,
            Self::RequestIdMismatch => ErrorKind::Authentication,
            Self::Quote(_) => ErrorKind::UnauthenticatedQuote,
            Self::Signature(_) => ErrorKind::Signature,
            Self::Entropy(_) => ErrorKind::Environment,
        }
    }

    /// Returns true if this error is fatal for the in-flight attempt.
    ///
    /// Nothing in this layer is retried internally, so every error is.
    pub fn is_fatal(&self) -> bool {
        true
    }
}
