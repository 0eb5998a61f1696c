//! Signed report verification.
//!
//! Establishes that the attestation authority vouched for the exact quote
//! received on this session, recently, with an acceptable verdict.
//!
//! # Order of checks
//!
//! 1. Chain and signature (delegated to a [`ChainValidator`])
//! 2. Report body parse
//! 3. Report quote body matches the received quote (first 432 bytes)
//! 4. Status is allow-listed
//! 5. Report is within the freshness window
//!
//! Nothing is read from the report body before its signature verifies.

use std::time::SystemTime;

use cds_crypto::ct_eq;
use cds_proto::{QUOTE_BODY_LEN, Quote, SignedReport};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{AttestationPolicy, ChainValidator, SignatureError, TrustConfig};

/// Report timestamp format, always UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Digits the authority always writes after the decimal point.
const FRACTION_DIGITS: usize = 6;

/// Parse a report timestamp.
///
/// The fraction must be exactly six digits, read as microseconds.
pub fn parse_timestamp(timestamp: &str) -> Result<SystemTime, SignatureError> {
    let fraction = timestamp.rsplit_once('.').map(|(_, fraction)| fraction);
    let exact = |f: &str| f.len() == FRACTION_DIGITS && f.bytes().all(|b| b.is_ascii_digit());
    if !fraction.is_some_and(exact) {
        return Err(SignatureError::InvalidTimestamp(format!(
            "{timestamp}: expected {FRACTION_DIGITS} fractional digits"
        )));
    }

    let naive = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| SignatureError::InvalidTimestamp(format!("{timestamp}: {e}")))?;
    Ok(SystemTime::from(naive.and_utc()))
}

/// Format a time the way the authority stamps reports.
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(TIMESTAMP_FORMAT).to_string()
}

/// Check that the report quote body covers the received quote.
fn check_quote_correspondence(report: &SignedReport, quote: &Quote) -> Result<(), SignatureError> {
    let signed = report.quote_body.get(..QUOTE_BODY_LEN);
    let received = quote.raw_bytes().get(..QUOTE_BODY_LEN);

    match (signed, received) {
        (Some(signed), Some(received)) if ct_eq(signed, received) => Ok(()),
        _ => Err(SignatureError::QuoteMismatch),
    }
}

/// Check status membership and freshness.
fn check_verdict(
    report: &SignedReport,
    policy: &AttestationPolicy,
    now: SystemTime,
) -> Result<(), SignatureError> {
    if !policy.accepts_status(&report.status) {
        return Err(SignatureError::Status(report.status.clone()));
    }

    let issued = parse_timestamp(&report.timestamp)?;
    let expired = issued.checked_add(policy.freshness_window).is_some_and(|expires| expires < now);
    if expired {
        return Err(SignatureError::Expired { timestamp: report.timestamp.clone() });
    }

    Ok(())
}

/// Verify the authority's signed report over `quote`.
///
/// `signed_report_json` must be the exact bytes that were signed. Returns
/// the parsed report on success.
pub fn verify_signed_report<V: ChainValidator + ?Sized>(
    config: &TrustConfig,
    validator: &V,
    certificate_chain_pem: &str,
    signed_report_json: &[u8],
    signature: &[u8],
    quote: &Quote,
    now: SystemTime,
) -> Result<SignedReport, SignatureError> {
    validator.verify(
        &config.trust_store,
        certificate_chain_pem,
        signed_report_json,
        signature,
        now,
    )?;

    let report = SignedReport::from_json(signed_report_json)?;

    let result = check_quote_correspondence(&report, quote)
        .and_then(|()| check_verdict(&report, &config.policy, now));

    match result {
        Ok(()) => {
            tracing::debug!(
                id = %report.id,
                status = %report.status,
                timestamp = %report.timestamp,
                advisories = report.advisory_ids.len(),
                "signed report verified"
            );
            Ok(report)
        },
        Err(e) => {
            tracing::warn!(id = %report.id, "signed report rejected: {}", e);
            Err(e)
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn timestamp_parses_as_utc() {
        let parsed = parse_timestamp("1970-01-02T00:00:01.500000").unwrap();
        assert_eq!(parsed, UNIX_EPOCH + Duration::from_millis(86_401_500));
    }

    #[test]
    fn timestamp_requires_six_fraction_digits() {
        assert!(matches!(
            parse_timestamp("2026-10-16T12:00:00.123"),
            Err(SignatureError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            parse_timestamp("2026-10-16T12:00:00.123456789"),
            Err(SignatureError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            parse_timestamp("2026-10-16T12:00:00"),
            Err(SignatureError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            parse_timestamp("2026-10-16 12:00:00.123456"),
            Err(SignatureError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn format_then_parse_is_identity_at_microseconds() {
        let time = UNIX_EPOCH + Duration::from_micros(1_792_000_000_123_456);
        assert_eq!(parse_timestamp(&format_timestamp(time)).unwrap(), time);
    }

    fn report(status: &str, timestamp: &str) -> SignedReport {
        SignedReport {
            id: "1".into(),
            timestamp: timestamp.into(),
            version: Some(3),
            status: status.into(),
            quote_body: vec![0; QUOTE_BODY_LEN],
            platform_info_blob: None,
            advisory_url: None,
            advisory_ids: Vec::new(),
            nonce: None,
        }
    }

    fn hours_ago(now: SystemTime, hours: u64) -> String {
        format_timestamp(now - Duration::from_secs(hours * 3600))
    }

    #[test]
    fn verdict_matrix() {
        let now = UNIX_EPOCH + Duration::from_secs(1_792_000_000);
        let relaxed = AttestationPolicy::default();
        let strict = AttestationPolicy::strict();

        assert_eq!(check_verdict(&report("OK", &hours_ago(now, 23)), &strict, now), Ok(()));
        assert_eq!(
            check_verdict(&report("GROUP_OUT_OF_DATE", &hours_ago(now, 1)), &relaxed, now),
            Ok(())
        );
        assert_eq!(
            check_verdict(&report("GROUP_OUT_OF_DATE", &hours_ago(now, 1)), &strict, now),
            Err(SignatureError::Status("GROUP_OUT_OF_DATE".into()))
        );
        assert!(matches!(
            check_verdict(&report("OK", &hours_ago(now, 25)), &strict, now),
            Err(SignatureError::Expired { .. })
        ));
    }

    #[test]
    fn report_exactly_at_window_edge_is_fresh() {
        let now = UNIX_EPOCH + Duration::from_secs(1_792_000_000);
        let policy = AttestationPolicy::strict();
        assert_eq!(check_verdict(&report("OK", &hours_ago(now, 24)), &policy, now), Ok(()));
    }

    #[test]
    fn status_is_checked_before_timestamp() {
        let now = UNIX_EPOCH + Duration::from_secs(1_792_000_000);
        let policy = AttestationPolicy::strict();
        let result = check_verdict(&report("KEY_REVOKED", "garbage"), &policy, now);
        assert_eq!(result, Err(SignatureError::Status("KEY_REVOKED".into())));
    }

    proptest! {
        #[test]
        fn prop_expired_exactly_when_older_than_window(
            age_secs in 0u64..(3 * 86_400),
            window_secs in 1u64..(2 * 86_400),
        ) {
            let now = UNIX_EPOCH + Duration::from_secs(1_792_000_000);
            let issued = format_timestamp(now - Duration::from_secs(age_secs));
            let policy =
                AttestationPolicy::strict().with_freshness_window(Duration::from_secs(window_secs));

            let result = check_verdict(&report("OK", &issued), &policy, now);
            if age_secs > window_secs {
                let expired = matches!(result, Err(SignatureError::Expired { .. }));
                prop_assert!(expired);
            } else {
                prop_assert_eq!(result, Ok(()));
            }
        }
    }
}
