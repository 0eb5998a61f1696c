//! CDS trust core
//!
//! Decides whether the contact discovery enclave can be trusted and seals
//! lookups for it once it is.
//!
//! # Architecture
//!
//! ```text
//! session keys ──► DiscoveryCipher ──► DiscoveryRequest ──► (transport)
//!                                                               │
//!            quote + signed report + certificates ◄─────────────┘
//!                          │
//!                          ▼
//!               AttestationVerifier
//!                 ├─ verify_quote          (report data, measurement, debug)
//!                 └─ verify_signed_report  (chain, body, status, freshness)
//!                          │
//!                          ▼
//!         DiscoveryCipher::response_data  (only after both pass)
//! ```
//!
//! # Components
//!
//! - [`Environment`]: wall clock and randomness, [`SystemEnv`] in production
//! - [`TrustConfig`], [`AttestationPolicy`], [`TrustStore`]: explicit trust
//!   inputs, never global
//! - [`verify_quote`], [`verify_signed_report`]: the two trust checks
//! - [`ChainValidator`], [`WebPkiValidator`]: certificate chain and signature
//!   delegation
//! - [`DiscoveryCipher`]: session-bound AEAD codec
//! - [`AttestationVerifier`]: runs both checks for one bundle

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod attestation;
pub mod cipher;
pub mod config;
pub mod env;
pub mod error;
pub mod quote;
pub mod report;
mod system_env;
pub mod validator;

pub use attestation::{AttestationBundle, AttestationVerifier, VerifiedAttestation};
pub use cds_crypto::SessionKeys;
pub use cipher::DiscoveryCipher;
pub use config::{AttestationPolicy, DEFAULT_FRESHNESS_WINDOW, TrustConfig, TrustStore};
pub use env::Environment;
pub use error::{ConfigError, ErrorKind, QuoteError, SignatureError, TrustError};
pub use quote::{verify_quote, verify_raw_quote};
pub use report::{TIMESTAMP_FORMAT, format_timestamp, parse_timestamp, verify_signed_report};
pub use system_env::SystemEnv;
pub use validator::{ChainValidator, WebPkiValidator, parse_pem_chain};
