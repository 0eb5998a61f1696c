//! CDS wire-level value types
//!
//! Structured values exchanged with the contact discovery enclave. The
//! transport owns the envelope framing; this crate owns the byte-exact shape
//! of what goes inside it.
//!
//! # Components
//!
//! - [`DiscoveryRequest`]: encrypted address lookup sent to the enclave
//! - [`DiscoveryResponse`], [`AttestationResponse`]: encrypted payloads
//!   returned by the enclave
//! - [`Quote`]: hardware attestation quote parsed from raw bytes
//! - [`SignedReport`]: attestation authority report body parsed from JSON
//!
//! # Invariants
//!
//! - Nonces are always [`NONCE_LEN`] bytes and tags always [`TAG_LEN`] bytes;
//!   constructors reject anything else.
//! - A [`Quote`] only exists if its raw bytes passed structural validation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod messages;
pub mod quote;
pub mod report;

pub use error::ProtoError;
pub use messages::{ADDRESS_LEN, AttestationResponse, DiscoveryRequest, DiscoveryResponse};
pub use quote::{AttributeFlags, QUOTE_BODY_LEN, Quote};
pub use report::{QuoteStatus, SignedReport};

/// AEAD nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AEAD authentication tag length in bytes.
pub const TAG_LEN: usize = 16;
