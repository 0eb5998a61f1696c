//! Per-session symmetric keys.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::CodecError;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Keys for one attestation session.
///
/// Produced by key agreement outside this crate. The client key seals
/// requests; the server key opens responses. Both are wiped on drop and
/// never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    client_key: [u8; KEY_LEN],
    server_key: [u8; KEY_LEN],
}

impl SessionKeys {
    /// Create session keys from fixed-size arrays.
    pub fn new(client_key: [u8; KEY_LEN], server_key: [u8; KEY_LEN]) -> Self {
        Self { client_key, server_key }
    }

    /// Create session keys from raw slices.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyLength` unless both slices are exactly 32 bytes.
    pub fn from_slices(client_key: &[u8], server_key: &[u8]) -> Result<Self, CodecError> {
        Ok(Self::new(to_key(client_key)?, to_key(server_key)?))
    }

    /// Key sealing client-to-server payloads.
    pub fn client_key(&self) -> &[u8; KEY_LEN] {
        &self.client_key
    }

    /// Key opening server-to-client payloads.
    pub fn server_key(&self) -> &[u8; KEY_LEN] {
        &self.server_key
    }
}

fn to_key(bytes: &[u8]) -> Result<[u8; KEY_LEN], CodecError> {
    bytes
        .try_into()
        .map_err(|_| CodecError::InvalidKeyLength { expected: KEY_LEN, actual: bytes.len() })
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKeys([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slices_rejects_short_key() {
        let result = SessionKeys::from_slices(&[0; 16], &[0; KEY_LEN]);
        assert_eq!(
            result.unwrap_err(),
            CodecError::InvalidKeyLength { expected: KEY_LEN, actual: 16 }
        );
    }

    #[test]
    fn debug_is_redacted() {
        let keys = SessionKeys::new([0x42; KEY_LEN], [0x43; KEY_LEN]);
        assert_eq!(format!("{keys:?}"), "SessionKeys([REDACTED])");
    }
}
