//! Trust configuration.
//!
//! Everything the verifiers trust is passed in explicitly through these
//! values. There is no process-wide default trust state.
//!
//! # Relaxation toggles
//!
//! Two settings loosen trust and are kept as named policy fields so that
//! tightening them is a configuration change:
//!
//! - `allow_debug_quotes`: which debug flag a quote must carry
//! - `GROUP_OUT_OF_DATE` membership in `allowed_statuses`
//!
//! [`AttestationPolicy::default`] keeps both relaxed, matching the service's
//! current deployment. [`AttestationPolicy::strict`] is the production
//! setting.

use std::{collections::BTreeSet, time::Duration};

use cds_proto::QuoteStatus;
use rustls_pki_types::{CertificateDer, TrustAnchor};

use crate::ConfigError;

/// Default report freshness window: one day.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Operator-controlled acceptance policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationPolicy {
    /// Debug flag a quote must carry. `true` accepts only debug enclaves,
    /// `false` only production enclaves.
    pub allow_debug_quotes: bool,
    /// Authority statuses that are accepted.
    pub allowed_statuses: BTreeSet<QuoteStatus>,
    /// Maximum age of a signed report.
    pub freshness_window: Duration,
}

impl AttestationPolicy {
    /// Production policy: production enclaves only, status `OK` only.
    pub fn strict() -> Self {
        Self {
            allow_debug_quotes: false,
            allowed_statuses: BTreeSet::from([QuoteStatus::Ok]),
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
        }
    }

    /// Set the expected debug flag.
    #[must_use]
    pub fn with_allow_debug_quotes(mut self, allow: bool) -> Self {
        self.allow_debug_quotes = allow;
        self
    }

    /// Accept an additional authority status.
    #[must_use]
    pub fn allow_status(mut self, status: QuoteStatus) -> Self {
        self.allowed_statuses.insert(status);
        self
    }

    /// Stop accepting an authority status.
    #[must_use]
    pub fn deny_status(mut self, status: &QuoteStatus) -> Self {
        self.allowed_statuses.remove(status);
        self
    }

    /// Set the freshness window.
    #[must_use]
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Whether a status string is accepted.
    pub fn accepts_status(&self, status: &str) -> bool {
        self.allowed_statuses.contains(&QuoteStatus::from(status))
    }
}

impl Default for AttestationPolicy {
    /// Relaxed policy: debug enclaves, `OK` and `GROUP_OUT_OF_DATE`.
    fn default() -> Self {
        Self::strict().with_allow_debug_quotes(true).allow_status(QuoteStatus::GroupOutOfDate)
    }
}

/// Root certificates the authority chain must anchor at.
#[derive(Debug, Clone)]
pub struct TrustStore {
    anchors: Vec<TrustAnchor<'static>>,
}

impl TrustStore {
    /// Load roots from PEM text.
    pub fn from_pem(pem: &[u8]) -> Result<Self, ConfigError> {
        let mut reader = pem;
        let certs = rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidTrustStore(e.to_string()))?;
        Self::from_der_certificates(&certs)
    }

    /// Load roots from DER certificates.
    pub fn from_der_certificates(certs: &[CertificateDer<'_>]) -> Result<Self, ConfigError> {
        let anchors = certs
            .iter()
            .map(|cert| {
                webpki::anchor_from_trusted_cert(cert)
                    .map(|anchor| anchor.to_owned())
                    .map_err(|e| ConfigError::InvalidTrustStore(format!("{e:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if anchors.is_empty() {
            return Err(ConfigError::EmptyTrustStore);
        }
        Ok(Self { anchors })
    }

    /// Trust anchors, in load order.
    pub fn anchors(&self) -> &[TrustAnchor<'static>] {
        &self.anchors
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Always false for a constructed store.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Everything one verification call trusts.
#[derive(Clone)]
pub struct TrustConfig {
    /// Roots for the authority certificate chain.
    pub trust_store: TrustStore,
    /// Allow-listed code measurement, hex.
    pub expected_mrenclave: String,
    /// Server static public key the quote must bind.
    pub expected_server_public_key: Vec<u8>,
    /// Acceptance policy.
    pub policy: AttestationPolicy,
}

impl TrustConfig {
    /// Build a configuration with the default policy.
    pub fn new(
        trust_store: TrustStore,
        expected_mrenclave: impl Into<String>,
        expected_server_public_key: Vec<u8>,
    ) -> Self {
        Self {
            trust_store,
            expected_mrenclave: expected_mrenclave.into(),
            expected_server_public_key,
            policy: AttestationPolicy::default(),
        }
    }

    /// Replace the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: AttestationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl std::fmt::Debug for TrustConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustConfig")
            .field("trust_store_roots", &self.trust_store.len())
            .field("expected_mrenclave", &self.expected_mrenclave)
            .field(
                "expected_server_public_key",
                &format!("<{} bytes>", self.expected_server_public_key.len()),
            )
            .field("policy", &self.policy)
            .finish()
    }
}
