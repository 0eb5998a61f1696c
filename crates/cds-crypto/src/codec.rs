//! AEAD codec for lookup requests and enclave responses.
//!
//! Requests are a concatenation of 8-byte big-endian addresses sealed with
//! AES-256-GCM under the session's client key, with the request id bound as
//! associated data. Responses are sealed under the server key with no
//! associated data.
//!
//! # Invariants
//!
//! - Tags are exactly [`TAG_LEN`] bytes.
//! - Ciphertext length equals plaintext length.
//! - A nonce must never be reused under the same key. This module takes the
//!   nonce from the caller and cannot enforce that; callers draw a fresh one
//!   per request.

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, Payload},
};
use cds_proto::{
    ADDRESS_LEN, AttestationResponse, DiscoveryRequest, DiscoveryResponse, NONCE_LEN, TAG_LEN,
};
use zeroize::Zeroizing;

use crate::{CodecError, KEY_LEN, SessionKeys};

/// Parse and encode addresses as consecutive 8-byte big-endian integers.
pub fn encode_addresses<S: AsRef<str>>(addresses: &[S]) -> Result<Vec<u8>, CodecError> {
    let mut plaintext = Vec::with_capacity(addresses.len() * ADDRESS_LEN);
    for (index, address) in addresses.iter().enumerate() {
        let value: i64 =
            address.as_ref().parse().map_err(|_| CodecError::InvalidAddress { index })?;
        plaintext.extend_from_slice(&value.to_be_bytes());
    }
    Ok(plaintext)
}

/// Decode a decrypted address buffer.
pub fn decode_addresses(plaintext: &[u8]) -> Result<Vec<i64>, CodecError> {
    let (chunks, remainder) = plaintext.as_chunks::<ADDRESS_LEN>();
    if !remainder.is_empty() {
        return Err(CodecError::TruncatedPlaintext(plaintext.len()));
    }
    Ok(chunks.iter().map(|chunk| i64::from_be_bytes(*chunk)).collect())
}

/// Split sealed AEAD output into ciphertext and a 16-byte tag.
///
/// AEAD bindings disagree on where the tag lands: appended to the stream,
/// returned separately, or returned by a finalize step together with
/// trailing ciphertext bytes. `segments` is whatever the binding produced,
/// in order. The last [`TAG_LEN`] bytes are the tag; everything before it is
/// ciphertext and must be exactly `plaintext_len` bytes.
pub fn split_sealed(
    segments: &[&[u8]],
    plaintext_len: usize,
) -> Result<(Vec<u8>, [u8; TAG_LEN]), CodecError> {
    let total: usize = segments.iter().map(|s| s.len()).sum();
    if total != plaintext_len + TAG_LEN {
        return Err(CodecError::Encryption);
    }

    let mut ciphertext = segments.concat();
    let tag_bytes = ciphertext.split_off(plaintext_len);
    let tag = tag_bytes.as_slice().try_into().map_err(|_| CodecError::Encryption)?;

    Ok((ciphertext, tag))
}

/// Seal `plaintext` under `key`, returning ciphertext and tag separately.
///
/// Same nonce rules as [`encrypt_request`]. The enclave side of the
/// protocol seals responses this way with the server key and empty
/// associated data.
pub fn encrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN]), CodecError> {
    let cipher = Aes256Gcm::new(key.into());
    let sealed = cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| CodecError::Encryption)?;

    split_sealed(&[&sealed], plaintext.len())
}

/// Build an encrypted lookup request.
///
/// # Security
///
/// `nonce` must be fresh random bytes never used before with
/// `keys.client_key()`. Reusing a nonce under AES-GCM leaks the XOR of the
/// plaintexts and the authentication key.
///
/// # Errors
///
/// - `InvalidAddress` if an address does not parse as `i64`
/// - `TooManyAddresses` if the count exceeds `u32::MAX`
pub fn encrypt_request<S: AsRef<str>>(
    addresses: &[S],
    keys: &SessionKeys,
    request_id: &[u8],
    nonce: [u8; NONCE_LEN],
) -> Result<DiscoveryRequest, CodecError> {
    let address_count =
        u32::try_from(addresses.len()).map_err(|_| CodecError::TooManyAddresses(addresses.len()))?;

    let plaintext = Zeroizing::new(encode_addresses(addresses)?);
    let (ciphertext, tag) = encrypt(keys.client_key(), &nonce, &plaintext, request_id)?;

    Ok(DiscoveryRequest::new(address_count, request_id.to_vec(), nonce, ciphertext, tag)?)
}

/// Authenticate and decrypt a payload.
///
/// Ciphertext and tag are joined into one buffer before opening. On tag
/// failure nothing is returned and the error does not say why.
pub fn decrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
    aad: &[u8],
) -> Result<Vec<u8>, CodecError> {
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    let cipher = Aes256Gcm::new(key.into());
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: &combined, aad })
        .map_err(|_| CodecError::Authentication)
}

/// Open a lookup request with the client key and its request id.
pub fn decrypt_request(
    request: &DiscoveryRequest,
    keys: &SessionKeys,
) -> Result<Vec<u8>, CodecError> {
    decrypt(
        keys.client_key(),
        request.nonce(),
        request.ciphertext(),
        request.tag(),
        request.request_id(),
    )
}

/// Decrypt the lookup result with the server key.
pub fn get_response_data(
    response: &DiscoveryResponse,
    keys: &SessionKeys,
) -> Result<Vec<u8>, CodecError> {
    decrypt(keys.server_key(), &response.nonce, &response.ciphertext, &response.tag, &[])
}

/// Recover the request id the enclave echoed in its attestation response.
pub fn get_request_id(
    keys: &SessionKeys,
    response: &AttestationResponse,
) -> Result<Vec<u8>, CodecError> {
    decrypt(keys.server_key(), &response.nonce, &response.ciphertext, &response.tag, &[])
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;

    fn zero_keys() -> SessionKeys {
        SessionKeys::new([0; KEY_LEN], [0; KEY_LEN])
    }

    fn request_id() -> Vec<u8> {
        (0u8..16).collect()
    }

    fn seal_response(keys: &SessionKeys, nonce: [u8; NONCE_LEN], data: &[u8]) -> DiscoveryResponse {
        let (ciphertext, tag) = encrypt(keys.server_key(), &nonce, data, &[]).unwrap();
        DiscoveryResponse { nonce, ciphertext, tag }
    }

    #[test]
    fn two_addresses_encrypt_to_sixteen_bytes() {
        let addresses = ["15551234567", "15557654321"];
        let request = encrypt_request(&addresses, &zero_keys(), &request_id(), [7; NONCE_LEN])
            .unwrap();

        assert_eq!(request.address_count(), 2);
        assert_eq!(request.ciphertext().len(), 16);
        assert_eq!(request.tag().len(), TAG_LEN);
        assert_eq!(request.request_id(), &request_id()[..]);

        let plaintext = decrypt(
            &[0; KEY_LEN],
            request.nonce(),
            request.ciphertext(),
            request.tag(),
            &request_id(),
        )
        .unwrap();
        assert_eq!(plaintext, hex!("000000039eed0207 000000039f4ef731"));
    }

    #[test]
    fn encode_addresses_is_big_endian() {
        let encoded = encode_addresses(&["1", "+258", "-1"]).unwrap();
        assert_eq!(encoded, hex!("0000000000000001 0000000000000102 ffffffffffffffff"));
    }

    #[test]
    fn non_numeric_address_is_rejected() {
        let result = encrypt_request(&["123", "555-1234"], &zero_keys(), &[], [0; NONCE_LEN]);
        assert_eq!(result.unwrap_err(), CodecError::InvalidAddress { index: 1 });
    }

    #[test]
    fn out_of_range_address_is_rejected() {
        let result = encode_addresses(&["9223372036854775808"]);
        assert_eq!(result.unwrap_err(), CodecError::InvalidAddress { index: 0 });
    }

    #[test]
    fn empty_address_list_still_has_tag() {
        let addresses: [&str; 0] = [];
        let request = encrypt_request(&addresses, &zero_keys(), b"id", [1; NONCE_LEN]).unwrap();
        assert!(request.ciphertext().is_empty());
        assert_eq!(decrypt_request(&request, &zero_keys()).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn decode_addresses_rejects_partial_address() {
        assert_eq!(decode_addresses(&[0; 9]).unwrap_err(), CodecError::TruncatedPlaintext(9));
    }

    #[test]
    fn split_sealed_handles_appended_tag() {
        let mut sealed = vec![1u8; 8];
        sealed.extend_from_slice(&[9u8; TAG_LEN]);

        let (ciphertext, tag) = split_sealed(&[&sealed], 8).unwrap();
        assert_eq!(ciphertext, vec![1u8; 8]);
        assert_eq!(tag, [9u8; TAG_LEN]);
    }

    #[test]
    fn split_sealed_moves_finalize_overflow_into_ciphertext() {
        // Binding returned 5 of 8 ciphertext bytes from update and the other 3
        // in front of the tag from finalize.
        let update = [1u8; 5];
        let mut finalize = vec![2u8; 3];
        finalize.extend_from_slice(&[9u8; TAG_LEN]);

        let (ciphertext, tag) = split_sealed(&[&update, &finalize], 8).unwrap();
        assert_eq!(ciphertext, vec![1, 1, 1, 1, 1, 2, 2, 2]);
        assert_eq!(tag, [9u8; TAG_LEN]);
    }

    #[test]
    fn split_sealed_rejects_wrong_total() {
        assert_eq!(split_sealed(&[&[0u8; 20]], 8).unwrap_err(), CodecError::Encryption);
    }

    #[test]
    fn response_data_round_trip() {
        let keys = SessionKeys::new([1; KEY_LEN], [2; KEY_LEN]);
        let response = seal_response(&keys, [3; NONCE_LEN], b"registered: 0b0110");
        assert_eq!(get_response_data(&response, &keys).unwrap(), b"registered: 0b0110");
    }

    #[test]
    fn response_sealed_with_client_key_fails() {
        let keys = SessionKeys::new([1; KEY_LEN], [2; KEY_LEN]);
        let swapped = SessionKeys::new([2; KEY_LEN], [1; KEY_LEN]);
        let response = seal_response(&swapped, [3; NONCE_LEN], b"data");
        assert_eq!(get_response_data(&response, &keys).unwrap_err(), CodecError::Authentication);
    }

    #[test]
    fn request_id_is_recovered() {
        let keys = SessionKeys::new([5; KEY_LEN], [6; KEY_LEN]);
        let sealed = seal_response(&keys, [8; NONCE_LEN], &request_id());
        let response =
            AttestationResponse::from_parts(&sealed.nonce, sealed.ciphertext, &sealed.tag).unwrap();

        assert_eq!(get_request_id(&keys, &response).unwrap(), request_id());
    }

    fn arb_addresses() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(any::<i64>().prop_map(|a| a.to_string()), 0..32)
    }

    proptest! {
        #[test]
        fn request_round_trip(
            addresses in arb_addresses(),
            client_key: [u8; KEY_LEN],
            nonce: [u8; NONCE_LEN],
            request_id in prop::collection::vec(any::<u8>(), 0..32),
        ) {
            let keys = SessionKeys::new(client_key, [0; KEY_LEN]);
            let request = encrypt_request(&addresses, &keys, &request_id, nonce).unwrap();

            prop_assert_eq!(request.ciphertext().len(), 8 * addresses.len());
            prop_assert_eq!(request.address_count() as usize, addresses.len());

            let plaintext = decrypt_request(&request, &keys).unwrap();
            prop_assert_eq!(&plaintext, &encode_addresses(&addresses).unwrap());

            let decoded: Vec<String> =
                decode_addresses(&plaintext).unwrap().iter().map(i64::to_string).collect();
            prop_assert_eq!(decoded, addresses);
        }

        #[test]
        fn any_bit_flip_fails_authentication(
            addresses in prop::collection::vec(any::<i64>().prop_map(|a| a.to_string()), 1..8),
            client_key: [u8; KEY_LEN],
            nonce: [u8; NONCE_LEN],
            target in 0usize..4,
            position: prop::sample::Index,
            bit in 0u8..8,
        ) {
            let keys = SessionKeys::new(client_key, [0; KEY_LEN]);
            let request_id = b"request-id-bytes".to_vec();
            let request = encrypt_request(&addresses, &keys, &request_id, nonce).unwrap();

            let mut nonce = *request.nonce();
            let mut ciphertext = request.ciphertext().to_vec();
            let mut tag = *request.tag();
            let mut aad = request_id;

            let field: &mut [u8] = match target {
                0 => ciphertext.as_mut_slice(),
                1 => &mut tag[..],
                2 => &mut nonce[..],
                _ => aad.as_mut_slice(),
            };
            let i = position.index(field.len());
            field[i] ^= 1 << bit;

            let result = decrypt(keys.client_key(), &nonce, &ciphertext, &tag, &aad);
            prop_assert_eq!(result, Err(CodecError::Authentication));
        }
    }
}
