//! Composite attestation verifier.
//!
//! Runs quote verification and signed report verification against one
//! [`TrustConfig`]. Both must pass before anything the enclave sends is
//! trusted.

use std::time::SystemTime;

use cds_proto::{AttestationResponse, Quote, SignedReport};

use crate::{
    ChainValidator, Environment, TrustConfig, TrustError, quote::verify_raw_quote,
    report::verify_signed_report,
};

/// Evidence delivered by the enclave for one attestation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationBundle {
    /// Raw quote bytes.
    pub quote: Vec<u8>,
    /// Authority certificate chain, PEM, leaf first.
    pub certificates: String,
    /// Authority report body, exactly as signed.
    pub signature_body: Vec<u8>,
    /// Authority signature over `signature_body`.
    pub signature: Vec<u8>,
}

impl From<&AttestationResponse> for AttestationBundle {
    fn from(response: &AttestationResponse) -> Self {
        Self {
            quote: response.quote.clone(),
            certificates: response.certificates.clone(),
            signature_body: response.signature_body.as_bytes().to_vec(),
            signature: response.signature.clone(),
        }
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedAttestation {
    /// The verified quote.
    pub quote: Quote,
    /// The verified authority report.
    pub report: SignedReport,
    /// Time the verification was judged at.
    pub verified_at: SystemTime,
}

/// Verifies attestation evidence against a fixed trust configuration.
pub struct AttestationVerifier<E: Environment, V: ChainValidator> {
    config: TrustConfig,
    validator: V,
    env: E,
}

impl<E: Environment, V: ChainValidator> AttestationVerifier<E, V> {
    /// Create a verifier.
    pub fn new(config: TrustConfig, validator: V, env: E) -> Self {
        Self { config, validator, env }
    }

    /// The trust configuration in force.
    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    /// Verify a bundle: quote first, then the authority's report over it.
    pub fn verify(&self, bundle: &AttestationBundle) -> Result<VerifiedAttestation, TrustError> {
        let now = self.env.now();

        let quote = verify_raw_quote(
            &bundle.quote,
            &self.config.expected_server_public_key,
            &self.config.expected_mrenclave,
            &self.config.policy,
        )?;

        let report = verify_signed_report(
            &self.config,
            &self.validator,
            &bundle.certificates,
            &bundle.signature_body,
            &bundle.signature,
            &quote,
            now,
        )?;

        tracing::info!(
            mrenclave = %hex::encode(quote.mrenclave()),
            status = %report.status,
            "enclave attestation verified"
        );

        Ok(VerifiedAttestation { quote, report, verified_at: now })
    }

    /// Verify the evidence carried in an attestation response.
    pub fn verify_response(
        &self,
        response: &AttestationResponse,
    ) -> Result<VerifiedAttestation, TrustError> {
        self.verify(&AttestationBundle::from(response))
    }
}

impl<E: Environment, V: ChainValidator> std::fmt::Debug for AttestationVerifier<E, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationVerifier").field("config", &self.config).finish_non_exhaustive()
    }
}
