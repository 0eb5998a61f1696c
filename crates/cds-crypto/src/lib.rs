//! CDS Cryptographic Primitives
//!
//! This crate provides the cryptographic building blocks for talking to the
//! contact discovery enclave: the AEAD codec for lookup requests and
//! responses, session key handling and the constant-time equality primitive.
//!
//! # Design
//!
//! All functions in this crate are pure. The nonce required for encryption
//! must be provided by the caller, enabling:
//!
//! - Deterministic testing with seeded RNG
//! - No coupling to a particular entropy source
//!
//! # Security Properties
//!
//! - Confidentiality and integrity: AES-256-GCM with a 128-bit tag, request
//!   id bound as associated data
//! - No partial output: decryption either authenticates the whole buffer or
//!   returns nothing
//! - Timing: security-relevant comparisons go through [`ct_eq`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod ct;
pub mod error;
pub mod keys;

pub use codec::{
    decode_addresses, decrypt, decrypt_request, encode_addresses, encrypt, encrypt_request,
    get_request_id, get_response_data, split_sealed,
};
pub use ct::ct_eq;
pub use error::CodecError;
pub use keys::{KEY_LEN, SessionKeys};
