//! Authority certificate chain and signature validation.
//!
//! The signature verifier delegates chain building and signature checking to
//! a [`ChainValidator`]. [`WebPkiValidator`] is the production
//! implementation; tests may substitute their own.

use std::time::{SystemTime, UNIX_EPOCH};

use rustls_pki_types::{CertificateDer, SignatureVerificationAlgorithm, UnixTime};
use webpki::{EndEntityCert, KeyUsage};

use crate::{SignatureError, TrustStore};

/// Validates the authority's certificate chain and its signature over a
/// report body.
///
/// Implementations may block on keystore access; no timeout is imposed here.
pub trait ChainValidator: Send + Sync {
    /// Build a path from the first certificate in `certificate_chain_pem`
    /// to a root in `trust_store`, valid at `now`, and verify `signature`
    /// over `message` with the leaf key.
    fn verify(
        &self,
        trust_store: &TrustStore,
        certificate_chain_pem: &str,
        message: &[u8],
        signature: &[u8],
        now: SystemTime,
    ) -> Result<(), SignatureError>;
}

/// Algorithms accepted for chain and report signatures.
///
/// The authority signs with RSA PKCS#1 SHA-256.
static DEFAULT_ALGORITHMS: &[&dyn SignatureVerificationAlgorithm] = &[
    webpki::ring::RSA_PKCS1_2048_8192_SHA256,
    webpki::ring::RSA_PKCS1_2048_8192_SHA384,
    webpki::ring::ECDSA_P256_SHA256,
    webpki::ring::ECDSA_P384_SHA384,
];

/// Chain validator backed by `rustls-webpki`.
#[derive(Debug, Clone, Copy)]
pub struct WebPkiValidator {
    algorithms: &'static [&'static dyn SignatureVerificationAlgorithm],
}

impl WebPkiValidator {
    /// Validator accepting the default algorithm set.
    pub fn new() -> Self {
        Self { algorithms: DEFAULT_ALGORITHMS }
    }

    /// Validator accepting only `algorithms`.
    pub fn with_algorithms(
        algorithms: &'static [&'static dyn SignatureVerificationAlgorithm],
    ) -> Self {
        Self { algorithms }
    }
}

impl Default for WebPkiValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a PEM chain, leaf first.
pub fn parse_pem_chain(pem: &str) -> Result<Vec<CertificateDer<'static>>, SignatureError> {
    let mut reader = pem.as_bytes();
    let chain = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SignatureError::Chain(format!("unreadable pem: {e}")))?;

    if chain.is_empty() {
        return Err(SignatureError::Chain("no certificates in chain".to_string()));
    }
    Ok(chain)
}

impl ChainValidator for WebPkiValidator {
    fn verify(
        &self,
        trust_store: &TrustStore,
        certificate_chain_pem: &str,
        message: &[u8],
        signature: &[u8],
        now: SystemTime,
    ) -> Result<(), SignatureError> {
        let chain = parse_pem_chain(certificate_chain_pem)?;
        let (leaf, intermediates) = chain
            .split_first()
            .ok_or_else(|| SignatureError::Chain("no certificates in chain".to_string()))?;

        let leaf = EndEntityCert::try_from(leaf)
            .map_err(|e| SignatureError::Chain(format!("invalid leaf certificate: {e:?}")))?;

        let since_epoch = now
            .duration_since(UNIX_EPOCH)
            .map_err(|_| SignatureError::Chain("clock is before the unix epoch".to_string()))?;
        let time = UnixTime::since_unix_epoch(since_epoch);

        leaf.verify_for_usage(
            self.algorithms,
            trust_store.anchors(),
            intermediates,
            time,
            KeyUsage::server_auth(),
            None,
            None,
        )
        .map_err(|e| SignatureError::Chain(format!("{e:?}")))?;

        let verified = self
            .algorithms
            .iter()
            .any(|alg| leaf.verify_signature(*alg, message, signature).is_ok());

        if verified {
            tracing::debug!(chain_len = chain.len(), "report signature verified");
            Ok(())
        } else {
            tracing::warn!("report signature does not verify under leaf key");
            Err(SignatureError::BadSignature)
        }
    }
}
