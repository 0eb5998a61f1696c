//! Encrypted payloads exchanged with the enclave.
//!
//! All three types are immutable once built. Constructors enforce the fixed
//! nonce and tag lengths so nothing downstream has to re-check them.

use serde::{Deserialize, Serialize};

use crate::{NONCE_LEN, ProtoError, TAG_LEN};

/// Bytes each address occupies in the request plaintext.
pub const ADDRESS_LEN: usize = 8;

fn fixed<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N], ProtoError> {
    bytes
        .try_into()
        .map_err(|_| ProtoError::InvalidLength { field, expected: N, actual: bytes.len() })
}

/// Encrypted address lookup.
///
/// `ciphertext` always holds exactly `8 × address_count` bytes. Deserialized
/// requests go through [`DiscoveryRequest::new`] as well.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDiscoveryRequest")]
pub struct DiscoveryRequest {
    address_count: u32,
    request_id: Vec<u8>,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
    tag: [u8; TAG_LEN],
}

impl DiscoveryRequest {
    /// Assemble a request, checking the ciphertext covers every address.
    pub fn new(
        address_count: u32,
        request_id: Vec<u8>,
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
        tag: [u8; TAG_LEN],
    ) -> Result<Self, ProtoError> {
        let expected = usize::try_from(address_count)
            .ok()
            .and_then(|count| count.checked_mul(ADDRESS_LEN))
            .ok_or(ProtoError::InvalidLength {
                field: "ciphertext",
                expected: usize::MAX,
                actual: ciphertext.len(),
            })?;
        if ciphertext.len() != expected {
            return Err(ProtoError::InvalidLength {
                field: "ciphertext",
                expected,
                actual: ciphertext.len(),
            });
        }
        Ok(Self { address_count, request_id, nonce, ciphertext, tag })
    }

    /// Number of addresses encoded.
    pub fn address_count(&self) -> u32 {
        self.address_count
    }

    /// Request id, also the AEAD associated data.
    pub fn request_id(&self) -> &[u8] {
        &self.request_id
    }

    /// AEAD nonce.
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Encrypted address list.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// AEAD tag.
    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }
}

/// Wire shape of [`DiscoveryRequest`] before its lengths are checked.
#[derive(Deserialize)]
struct RawDiscoveryRequest {
    address_count: u32,
    request_id: Vec<u8>,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
    tag: [u8; TAG_LEN],
}

impl TryFrom<RawDiscoveryRequest> for DiscoveryRequest {
    type Error = ProtoError;

    fn try_from(raw: RawDiscoveryRequest) -> Result<Self, Self::Error> {
        Self::new(raw.address_count, raw.request_id, raw.nonce, raw.ciphertext, raw.tag)
    }
}

impl std::fmt::Debug for DiscoveryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryRequest")
            .field("address_count", &self.address_count)
            .field("request_id", &format!("<{} bytes>", self.request_id.len()))
            .field("ciphertext", &format!("<{} bytes>", self.ciphertext.len()))
            .finish_non_exhaustive()
    }
}

/// Encrypted lookup result returned by the enclave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    /// AEAD nonce.
    pub nonce: [u8; NONCE_LEN],
    /// Encrypted result bytes.
    pub ciphertext: Vec<u8>,
    /// AEAD tag.
    pub tag: [u8; TAG_LEN],
}

impl DiscoveryResponse {
    /// Build from transport-decoded slices, checking fixed lengths.
    pub fn from_parts(nonce: &[u8], ciphertext: Vec<u8>, tag: &[u8]) -> Result<Self, ProtoError> {
        Ok(Self { nonce: fixed("nonce", nonce)?, ciphertext, tag: fixed("tag", tag)? })
    }
}

/// Attestation handshake response.
///
/// The encrypted part carries the request id the enclave assigned to this
/// session. The remaining fields are the attestation evidence delivered with
/// it, already decoded by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationResponse {
    /// AEAD nonce.
    pub nonce: [u8; NONCE_LEN],
    /// Encrypted request id.
    pub ciphertext: Vec<u8>,
    /// AEAD tag.
    pub tag: [u8; TAG_LEN],
    /// Server ephemeral public key used in the handshake.
    #[serde(default)]
    pub server_ephemeral_public: Vec<u8>,
    /// Server static public key; bound into the quote report data.
    #[serde(default)]
    pub server_static_public: Vec<u8>,
    /// Raw attestation quote.
    #[serde(default)]
    pub quote: Vec<u8>,
    /// Authority signature over `signature_body`.
    #[serde(default)]
    pub signature: Vec<u8>,
    /// Authority certificate chain, PEM.
    #[serde(default)]
    pub certificates: String,
    /// Authority report body, exactly as signed.
    #[serde(default)]
    pub signature_body: String,
}

impl AttestationResponse {
    /// Build the encrypted part from transport-decoded slices.
    ///
    /// Evidence fields start empty; set them directly.
    pub fn from_parts(nonce: &[u8], ciphertext: Vec<u8>, tag: &[u8]) -> Result<Self, ProtoError> {
        Ok(Self {
            nonce: fixed("nonce", nonce)?,
            ciphertext,
            tag: fixed("tag", tag)?,
            server_ephemeral_public: Vec::new(),
            server_static_public: Vec::new(),
            quote: Vec::new(),
            signature: Vec::new(),
            certificates: String::new(),
            signature_body: String::new(),
        })
    }
}
