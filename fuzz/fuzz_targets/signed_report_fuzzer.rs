//! Fuzz target for signed report parsing and verdict helpers
//!
//! # Strategy
//!
//! - Arbitrary JSON-ish bytes into [`SignedReport::from_json`]
//! - Arbitrary timestamps into `parse_timestamp`
//! - Policy membership over arbitrary status strings
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - A parsed timestamp formats back to a string that parses to the same
//!   instant
//! - The strict policy accepts exactly `OK`

#![no_main]

use arbitrary::Arbitrary;
use cds_core::{AttestationPolicy, format_timestamp, parse_timestamp};
use cds_proto::SignedReport;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    body: Vec<u8>,
    timestamp: String,
    status: String,
}

fuzz_target!(|input: Input| {
    if let Ok(report) = SignedReport::from_json(&input.body) {
        let _ = parse_timestamp(&report.timestamp);
        let _ = report.quote_status();
    }

    if let Ok(time) = parse_timestamp(&input.timestamp) {
        let again = parse_timestamp(&format_timestamp(time));
        assert_eq!(again.ok(), Some(time));
    }

    let strict = AttestationPolicy::strict();
    assert_eq!(strict.accepts_status(&input.status), input.status == "OK");
});
