//! CLI error types.

use std::path::PathBuf;

use cds_core::{ConfigError, TrustError};
use thiserror::Error;

/// Errors that can occur while loading or verifying evidence.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A hex argument did not decode.
    #[error("invalid hex for {what}: {reason}")]
    Hex {
        /// Argument name.
        what: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The signature file is not base64.
    #[error("invalid base64 signature: {0}")]
    Base64(String),

    /// The chain file is not text.
    #[error("certificate chain is not UTF-8")]
    ChainEncoding,

    /// The trust store could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The evidence was rejected.
    #[error(transparent)]
    Trust(#[from] TrustError),
}
