//! Session-bound request/response cipher.
//!
//! Wraps the pure codec in `cds-crypto` with an [`Environment`] so every
//! request gets a freshly drawn nonce.

use cds_crypto::{SessionKeys, ct_eq};
use cds_proto::{AttestationResponse, DiscoveryRequest, DiscoveryResponse};

use crate::{Environment, TrustError};

/// Encrypts lookups and decrypts enclave responses.
#[derive(Debug, Clone)]
pub struct DiscoveryCipher<E: Environment> {
    env: E,
}

impl<E: Environment> DiscoveryCipher<E> {
    /// Create a cipher drawing nonces from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Encrypt an address list under the session's client key.
    ///
    /// A new random nonce is drawn on every call. `request_id` is bound as
    /// associated data.
    pub fn create_request<S: AsRef<str>>(
        &self,
        addresses: &[S],
        keys: &SessionKeys,
        request_id: &[u8],
    ) -> Result<DiscoveryRequest, TrustError> {
        let nonce = self.env.nonce()?;
        let request = cds_crypto::encrypt_request(addresses, keys, request_id, nonce)?;
        tracing::debug!(addresses = request.address_count(), "discovery request sealed");
        Ok(request)
    }

    /// Decrypt the lookup result.
    pub fn response_data(
        &self,
        response: &DiscoveryResponse,
        keys: &SessionKeys,
    ) -> Result<Vec<u8>, TrustError> {
        cds_crypto::get_response_data(response, keys).map_err(|e| {
            tracing::warn!("discovery response failed authentication");
            TrustError::from(e)
        })
    }

    /// Recover the request id echoed in the attestation response.
    pub fn request_id(
        &self,
        keys: &SessionKeys,
        response: &AttestationResponse,
    ) -> Result<Vec<u8>, TrustError> {
        Ok(cds_crypto::get_request_id(keys, response)?)
    }

    /// Check the echoed request id matches the one this session holds.
    pub fn verify_request_id(
        &self,
        keys: &SessionKeys,
        response: &AttestationResponse,
        expected: &[u8],
    ) -> Result<(), TrustError> {
        let echoed = self.request_id(keys, response)?;
        if ct_eq(&echoed, expected) {
            Ok(())
        } else {
            tracing::warn!("enclave echoed a different request id");
            Err(TrustError::RequestIdMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::ErrorKind;

    #[derive(Clone)]
    struct NoEntropy;

    impl Environment for NoEntropy {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH
        }

        fn random_bytes(&self, _buffer: &mut [u8]) -> Result<(), TrustError> {
            Err(TrustError::Entropy("unavailable".into()))
        }
    }

    #[test]
    fn entropy_failure_produces_no_request() {
        let cipher = DiscoveryCipher::new(NoEntropy);
        let keys = SessionKeys::new([0; 32], [0; 32]);

        let err = cipher.create_request(&["1"], &keys, b"id").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Environment);
    }
}
