//! Throwaway attestation authority.
//!
//! Mints a root and a report signing certificate on construction and signs
//! report bodies with the leaf key. The leaf is either a fresh ECDSA P-256
//! key or a fixed RSA 2048 key signing PKCS#1 SHA-256, the scheme the
//! production authority uses.

use std::time::SystemTime;

use base64::{Engine, engine::general_purpose::STANDARD};
use cds_core::{AttestationBundle, TrustStore, format_timestamp};
use cds_proto::QUOTE_BODY_LEN;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, PKCS_ECDSA_P256_SHA256,
};
use ring::{
    rand::SystemRandom,
    signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, RSA_PKCS1_SHA256, RsaKeyPair},
};

use crate::HarnessError;

/// Contents of a report the authority will sign.
#[derive(Debug, Clone)]
pub struct ReportTemplate {
    /// Report id.
    pub id: String,
    /// Status string, sent verbatim.
    pub status: String,
    /// Issue time.
    pub issued_at: SystemTime,
    /// Quote body to embed instead of the attested quote's own prefix.
    pub quote_body_override: Option<Vec<u8>>,
    /// Advisory ids.
    pub advisory_ids: Vec<String>,
}

impl ReportTemplate {
    /// `OK` report issued at `issued_at`.
    pub fn ok(issued_at: SystemTime) -> Self {
        Self {
            id: "165171271757108173876306223827987629752".to_string(),
            status: "OK".to_string(),
            issued_at,
            quote_body_override: None,
            advisory_ids: Vec::new(),
        }
    }

    /// Replace the status.
    #[must_use]
    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    /// Embed a different quote body.
    #[must_use]
    pub fn quote_body(mut self, body: Vec<u8>) -> Self {
        self.quote_body_override = Some(body);
        self
    }

    /// Attach advisory ids.
    #[must_use]
    pub fn advisories(mut self, ids: &[&str]) -> Self {
        self.advisory_ids = ids.iter().map(ToString::to_string).collect();
        self
    }
}

/// RSA 2048 PKCS#8 key used as the report signing key of RSA authorities.
///
/// Test material only; RSA keys cannot be generated with `ring`.
const RSA_REPORT_SIGNING_KEY: &[u8] = include_bytes!("keys/rsa2048_report_signing.pk8");

enum SigningKey {
    Ecdsa(EcdsaKeyPair),
    Rsa(RsaKeyPair),
}

/// Certificate authority and report signer for tests.
pub struct TestAuthority {
    root: rcgen::Certificate,
    leaf: rcgen::Certificate,
    signing_key: SigningKey,
    rng: SystemRandom,
}

impl TestAuthority {
    /// Authority with default names.
    pub fn new() -> Result<Self, HarnessError> {
        Self::named("Test Attestation")
    }

    /// Authority whose certificates carry `name`, signing with ECDSA P-256.
    pub fn named(name: &str) -> Result<Self, HarnessError> {
        let leaf_key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)?;
        let rng = SystemRandom::new();
        let signing_key = SigningKey::Ecdsa(EcdsaKeyPair::from_pkcs8(
            &ECDSA_P256_SHA256_ASN1_SIGNING,
            &leaf_key.serialize_der(),
            &rng,
        )?);
        Self::issue(name, &leaf_key, signing_key, rng)
    }

    /// Authority signing reports with RSA PKCS#1 SHA-256.
    ///
    /// Every RSA authority shares the same leaf key but gets its own root.
    pub fn rsa(name: &str) -> Result<Self, HarnessError> {
        let leaf_key = KeyPair::try_from(RSA_REPORT_SIGNING_KEY)?;
        let signing_key = SigningKey::Rsa(RsaKeyPair::from_pkcs8(RSA_REPORT_SIGNING_KEY)?);
        Self::issue(name, &leaf_key, signing_key, SystemRandom::new())
    }

    fn issue(
        name: &str,
        leaf_key: &KeyPair,
        signing_key: SigningKey,
        rng: SystemRandom,
    ) -> Result<Self, HarnessError> {
        let root_key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)?;
        let mut root_params = CertificateParams::new(Vec::<String>::new())?;
        root_params.distinguished_name = common_name(&format!("{name} Root CA"));
        root_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let root = root_params.self_signed(&root_key)?;

        let mut leaf_params = CertificateParams::new(vec!["attestation.test".to_string()])?;
        leaf_params.distinguished_name = common_name(&format!("{name} Report Signing"));
        leaf_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        let leaf = leaf_params.signed_by(leaf_key, &root, &root_key)?;

        Ok(Self { root, leaf, signing_key, rng })
    }

    /// Root certificate, PEM.
    pub fn root_pem(&self) -> String {
        self.root.pem()
    }

    /// Trust store holding only this authority's root.
    pub fn trust_store(&self) -> Result<TrustStore, HarnessError> {
        Ok(TrustStore::from_der_certificates(std::slice::from_ref(self.root.der()))?)
    }

    /// Chain as the service delivers it: leaf then root.
    pub fn chain_pem(&self) -> String {
        format!("{}{}", self.leaf.pem(), self.root.pem())
    }

    /// Sign `message` with the report signing key.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, HarnessError> {
        match &self.signing_key {
            SigningKey::Ecdsa(key) => Ok(key.sign(&self.rng, message)?.as_ref().to_vec()),
            SigningKey::Rsa(key) => {
                let mut signature = vec![0u8; key.public().modulus_len()];
                key.sign(&RSA_PKCS1_SHA256, &self.rng, message, &mut signature)?;
                Ok(signature)
            },
        }
    }

    /// Report body for `raw_quote`, as the authority would serialize it.
    pub fn report_json(&self, raw_quote: &[u8], template: &ReportTemplate) -> Vec<u8> {
        let body = template
            .quote_body_override
            .as_deref()
            .unwrap_or_else(|| &raw_quote[..raw_quote.len().min(QUOTE_BODY_LEN)]);

        serde_json::json!({
            "id": template.id,
            "timestamp": format_timestamp(template.issued_at),
            "version": 3,
            "isvEnclaveQuoteStatus": template.status,
            "isvEnclaveQuoteBody": STANDARD.encode(body),
            "advisoryIDs": template.advisory_ids,
        })
        .to_string()
        .into_bytes()
    }

    /// Sign a report over `raw_quote` and package it with the quote.
    pub fn attest(
        &self,
        raw_quote: &[u8],
        template: &ReportTemplate,
    ) -> Result<AttestationBundle, HarnessError> {
        let signature_body = self.report_json(raw_quote, template);
        let signature = self.sign(&signature_body)?;
        Ok(AttestationBundle {
            quote: raw_quote.to_vec(),
            certificates: self.chain_pem(),
            signature_body,
            signature,
        })
    }
}

impl std::fmt::Debug for TestAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestAuthority").finish_non_exhaustive()
    }
}

fn common_name(name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, name);
    dn
}
