//! Full client session against a simulated enclave.
//!
//! ```text
//! client                               enclave
//!   │ ◄── attestation response ──────── │  (request id + evidence)
//!   │  verify evidence, check echo      │
//!   │ ─── discovery request ──────────► │  (addresses under client key)
//!   │ ◄── discovery response ────────── │  (result under server key)
//! ```

use cds_core::{
    AttestationPolicy, AttestationVerifier, DiscoveryCipher, Environment, ErrorKind,
    SessionKeys, TrustConfig, TrustError, WebPkiValidator,
};
use cds_crypto::CodecError;
use cds_harness::{QuoteBuilder, ReportTemplate, SimEnclave, SimEnv, TestAuthority};
use proptest::prelude::*;

const SERVER_KEY: [u8; 32] = [0x42; 32];
const MRENCLAVE: [u8; 32] = [0xC0; 32];
const REQUEST_ID: [u8; 16] = *b"request-id-00001";

fn session_keys() -> SessionKeys {
    SessionKeys::new([0x01; 32], [0x02; 32])
}

#[test]
fn attested_session_round_trip() {
    let env = SimEnv::with_seed(100);
    let enclave_env = SimEnv::with_seed(200);
    let authority = TestAuthority::new().unwrap();
    let keys = session_keys();
    let enclave = SimEnclave::new(keys.clone(), enclave_env, SERVER_KEY.to_vec());

    let quote =
        QuoteBuilder::new().debug(false).mrenclave(MRENCLAVE).report_data(&SERVER_KEY).build();
    let evidence = authority.attest(&quote, &ReportTemplate::ok(env.now())).unwrap();
    let attestation = enclave.attestation_response(&REQUEST_ID, &evidence).unwrap();

    let config = TrustConfig::new(
        authority.trust_store().unwrap(),
        hex::encode(MRENCLAVE),
        SERVER_KEY.to_vec(),
    )
    .with_policy(AttestationPolicy::strict());
    let verifier = AttestationVerifier::new(config, WebPkiValidator::new(), env.clone());
    verifier.verify_response(&attestation).unwrap();

    let cipher = DiscoveryCipher::new(env);
    cipher.verify_request_id(&keys, &attestation, &REQUEST_ID).unwrap();

    let request =
        cipher.create_request(&["+14155550100", "4155550101"], &keys, &REQUEST_ID).unwrap();
    assert_eq!(request.address_count(), 2);
    assert_eq!(enclave.open_request(&request).unwrap(), vec![14_155_550_100, 4_155_550_101]);

    let response = enclave.respond(&[1, 0]).unwrap();
    assert_eq!(cipher.response_data(&response, &keys).unwrap(), vec![1, 0]);
}

#[test]
fn request_id_echo_mismatch_is_an_authentication_failure() {
    let keys = session_keys();
    let enclave = SimEnclave::new(keys.clone(), SimEnv::with_seed(1), SERVER_KEY.to_vec());
    let authority = TestAuthority::new().unwrap();
    let evidence = authority
        .attest(&QuoteBuilder::new().build(), &ReportTemplate::ok(SimEnv::with_seed(1).now()))
        .unwrap();
    let attestation = enclave.attestation_response(b"someone-elses-id", &evidence).unwrap();

    let cipher = DiscoveryCipher::new(SimEnv::with_seed(2));
    let err = cipher.verify_request_id(&keys, &attestation, &REQUEST_ID).unwrap_err();
    assert_eq!(err, TrustError::RequestIdMismatch);
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn response_under_wrong_server_key_fails_authentication() {
    let enclave =
        SimEnclave::new(SessionKeys::new([0x01; 32], [0x03; 32]), SimEnv::with_seed(3), Vec::new());
    let response = enclave.respond(b"result").unwrap();

    let cipher = DiscoveryCipher::new(SimEnv::with_seed(4));
    let err = cipher.response_data(&response, &session_keys()).unwrap_err();
    assert_eq!(err, TrustError::Codec(CodecError::Authentication));
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn same_seed_produces_identical_requests() {
    let keys = session_keys();
    let a = DiscoveryCipher::new(SimEnv::with_seed(9)).create_request(&["1"], &keys, &REQUEST_ID);
    let b = DiscoveryCipher::new(SimEnv::with_seed(9)).create_request(&["1"], &keys, &REQUEST_ID);
    assert_eq!(a.unwrap(), b.unwrap());
}

#[test]
fn every_request_gets_a_fresh_nonce() {
    let keys = session_keys();
    let cipher = DiscoveryCipher::new(SimEnv::with_seed(10));

    let first = cipher.create_request(&["1"], &keys, &REQUEST_ID).unwrap();
    let second = cipher.create_request(&["1"], &keys, &REQUEST_ID).unwrap();

    assert_ne!(first.nonce(), second.nonce());
    assert_ne!(first.ciphertext(), second.ciphertext());
}

#[test]
fn unparseable_address_is_a_format_error() {
    let cipher = DiscoveryCipher::new(SimEnv::with_seed(11));
    let err =
        cipher.create_request(&["1", "not-a-number"], &session_keys(), &REQUEST_ID).unwrap_err();
    assert_eq!(err, TrustError::Codec(CodecError::InvalidAddress { index: 1 }));
    assert_eq!(err.kind(), ErrorKind::Format);
}

proptest! {
    #[test]
    fn prop_enclave_recovers_any_address_list(
        seed in any::<u64>(),
        addresses in prop::collection::vec(any::<i64>(), 0..32),
    ) {
        let keys = session_keys();
        let cipher = DiscoveryCipher::new(SimEnv::with_seed(seed));
        let enclave = SimEnclave::new(keys.clone(), SimEnv::with_seed(seed ^ 1), Vec::new());

        let rendered: Vec<String> = addresses.iter().map(ToString::to_string).collect();
        let request = cipher.create_request(&rendered, &keys, &REQUEST_ID).unwrap();

        prop_assert_eq!(request.ciphertext().len(), addresses.len() * 8);
        prop_assert_eq!(enclave.open_request(&request).unwrap(), addresses);
    }
}
