//! Enclave side of a discovery session.

use cds_core::{AttestationBundle, Environment, SessionKeys};
use cds_crypto::CodecError;
use cds_proto::{AttestationResponse, DiscoveryRequest, DiscoveryResponse};

use crate::{HarnessError, SimEnv};

/// Opens client requests and seals responses the way the enclave does.
#[derive(Debug, Clone)]
pub struct SimEnclave {
    keys: SessionKeys,
    env: SimEnv,
    server_static_public: Vec<u8>,
}

impl SimEnclave {
    /// Enclave sharing `keys` with the client, drawing nonces from `env`.
    pub fn new(keys: SessionKeys, env: SimEnv, server_static_public: Vec<u8>) -> Self {
        Self { keys, env, server_static_public }
    }

    /// Decrypt a lookup request and decode its addresses.
    pub fn open_request(&self, request: &DiscoveryRequest) -> Result<Vec<i64>, CodecError> {
        let plaintext = cds_crypto::decrypt_request(request, &self.keys)?;
        cds_crypto::decode_addresses(&plaintext)
    }

    /// Seal a lookup result under the server key.
    pub fn respond(&self, data: &[u8]) -> Result<DiscoveryResponse, HarnessError> {
        let nonce = self.env.nonce()?;
        let (ciphertext, tag) = cds_crypto::encrypt(self.keys.server_key(), &nonce, data, &[])?;
        Ok(DiscoveryResponse { nonce, ciphertext, tag })
    }

    /// Attestation response echoing `request_id` and carrying `evidence`.
    pub fn attestation_response(
        &self,
        request_id: &[u8],
        evidence: &AttestationBundle,
    ) -> Result<AttestationResponse, HarnessError> {
        let nonce = self.env.nonce()?;
        let (ciphertext, tag) =
            cds_crypto::encrypt(self.keys.server_key(), &nonce, request_id, &[])?;

        Ok(AttestationResponse {
            nonce,
            ciphertext,
            tag,
            server_ephemeral_public: vec![0xEE; 32],
            server_static_public: self.server_static_public.clone(),
            quote: evidence.quote.clone(),
            signature: evidence.signature.clone(),
            certificates: evidence.certificates.clone(),
            signature_body: String::from_utf8_lossy(&evidence.signature_body).into_owned(),
        })
    }
}
