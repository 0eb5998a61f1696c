//! Fuzz target for [`Quote::from_bytes`] and the quote verifier
//!
//! # Strategy
//!
//! - Structured quotes: a well-formed body with fuzzed header fields, flags,
//!   reserved bytes and signature length, so the parser gets past the
//!   length check most of the time
//! - Raw bytes: arbitrary input straight into the parser
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - A parsed quote always carries INITTED and MODE64BIT
//! - `raw_bytes()` is exactly the input
//! - A quote whose report data does not start with the expected key is
//!   never accepted, whatever the policy

#![no_main]

use arbitrary::Arbitrary;
use cds_core::{AttestationPolicy, QuoteError, verify_quote};
use cds_proto::{AttributeFlags, QUOTE_BODY_LEN, Quote};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzedQuote {
    version: u16,
    sign_type: u16,
    flags: u64,
    mrenclave: [u8; 32],
    report_data: [u8; 64],
    reserved_poke: Option<(u16, u8)>,
    declared_signature_len: u32,
    signature: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
enum Input {
    Structured(FuzzedQuote),
    Raw(Vec<u8>),
}

fn build(q: &FuzzedQuote) -> Vec<u8> {
    let mut bytes = vec![0u8; QUOTE_BODY_LEN];
    bytes[0..2].copy_from_slice(&q.version.to_le_bytes());
    bytes[2..4].copy_from_slice(&q.sign_type.to_le_bytes());
    bytes[96..104].copy_from_slice(&q.flags.to_le_bytes());
    bytes[112..144].copy_from_slice(&q.mrenclave);
    bytes[368..432].copy_from_slice(&q.report_data);
    if let Some((offset, value)) = q.reserved_poke {
        let offset = usize::from(offset) % QUOTE_BODY_LEN;
        bytes[offset] = value;
    }
    bytes.extend_from_slice(&q.declared_signature_len.to_le_bytes());
    bytes.extend_from_slice(&q.signature);
    bytes
}

fuzz_target!(|input: Input| {
    let bytes = match &input {
        Input::Structured(q) => build(q),
        Input::Raw(raw) => raw.clone(),
    };

    let Ok(quote) = Quote::from_bytes(&bytes) else {
        return;
    };

    assert!(quote.flags().contains(AttributeFlags::INITTED | AttributeFlags::MODE64BIT));
    assert_eq!(quote.raw_bytes(), &bytes[..]);

    let mut wrong_key = [0u8; 32];
    wrong_key.copy_from_slice(&quote.report_data()[..32]);
    wrong_key[0] ^= 0xFF;

    let mrenclave = hex::encode(quote.mrenclave());
    for policy in [AttestationPolicy::default(), AttestationPolicy::strict()] {
        let result = verify_quote(&quote, &wrong_key, &mrenclave, &policy);
        assert_eq!(result, Err(QuoteError::ReportDataMismatch));
    }
});
