//! Fuzz target for the AEAD codec
//!
//! # Strategy
//!
//! - Seal fuzzed addresses under a fuzzed key and nonce
//! - Flip one fuzzed bit in ciphertext, tag, nonce or request id
//!
//! # Invariants
//!
//! - Untampered requests open to the encoded addresses
//! - Any single bit flip fails authentication and returns no plaintext
//! - Ciphertext length is always 8 bytes per address

#![no_main]

use arbitrary::Arbitrary;
use cds_crypto::{CodecError, SessionKeys, decrypt, encrypt_request};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Target {
    Ciphertext,
    Tag,
    Nonce,
    RequestId,
}

#[derive(Debug, Arbitrary)]
struct Input {
    key: [u8; 32],
    nonce: [u8; 12],
    request_id: Vec<u8>,
    addresses: Vec<i64>,
    target: Target,
    bit: u16,
}

fuzz_target!(|input: Input| {
    let keys = SessionKeys::new(input.key, [0; 32]);
    let rendered: Vec<String> = input.addresses.iter().map(ToString::to_string).collect();
    let Ok(request) = encrypt_request(&rendered, &keys, &input.request_id, input.nonce) else {
        return;
    };

    assert_eq!(request.ciphertext().len(), input.addresses.len() * 8);

    let mut ciphertext = request.ciphertext().to_vec();
    let mut tag = *request.tag();
    let mut nonce = *request.nonce();
    let mut aad = request.request_id().to_vec();

    let opened = decrypt(&input.key, &nonce, &ciphertext, &tag, &aad);
    let expected: Vec<u8> = input.addresses.iter().flat_map(|a| a.to_be_bytes()).collect();
    assert_eq!(opened.as_deref(), Ok(&expected[..]));

    let buffer: &mut [u8] = match input.target {
        Target::Ciphertext => &mut ciphertext,
        Target::Tag => &mut tag,
        Target::Nonce => &mut nonce,
        Target::RequestId => &mut aad,
    };
    if buffer.is_empty() {
        return;
    }
    let bit = usize::from(input.bit) % (buffer.len() * 8);
    buffer[bit / 8] ^= 1 << (bit % 8);

    let tampered = decrypt(&input.key, &nonce, &ciphertext, &tag, &aad);
    assert_eq!(tampered, Err(CodecError::Authentication));
});
