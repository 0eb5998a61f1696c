//! Fixture construction errors.

use thiserror::Error;

/// A fixture could not be built.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Certificate generation failed.
    #[error("certificate generation: {0}")]
    Certificate(#[from] rcgen::Error),

    /// Signing key was rejected or signing failed.
    #[error("signing: {0}")]
    Signing(String),

    /// Sealing or opening a payload failed.
    #[error("codec: {0}")]
    Codec(#[from] cds_crypto::CodecError),

    /// The simulated environment failed.
    #[error("environment: {0}")]
    Environment(#[from] cds_core::TrustError),

    /// Trust store could not be built from the authority root.
    #[error("trust store: {0}")]
    TrustStore(#[from] cds_core::ConfigError),
}

impl From<ring::error::KeyRejected> for HarnessError {
    fn from(err: ring::error::KeyRejected) -> Self {
        Self::Signing(err.to_string())
    }
}

impl From<ring::error::Unspecified> for HarnessError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::Signing("unspecified".to_string())
    }
}
