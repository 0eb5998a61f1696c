//! Quote verification.
//!
//! Binds the enclave's quote to this session and to an allow-listed code
//! image. Checks run in a fixed order and each failure is reported as its
//! own [`QuoteError`] variant so operators can tell them apart.

use cds_crypto::ct_eq;
use cds_proto::Quote;

use crate::{AttestationPolicy, QuoteError};

/// Verify a parsed quote against the expected server key and measurement.
///
/// 1. Report data must begin with `expected_public_key`.
/// 2. `mrenclave` must equal the hex-decoded `expected_mrenclave_hex`.
/// 3. The debug flag must equal `policy.allow_debug_quotes`.
pub fn verify_quote(
    quote: &Quote,
    expected_public_key: &[u8],
    expected_mrenclave_hex: &str,
    policy: &AttestationPolicy,
) -> Result<(), QuoteError> {
    let report_data = quote.report_data();
    let bound_key = report_data.get(..expected_public_key.len()).ok_or_else(|| {
        QuoteError::Malformed(format!(
            "report data holds {} bytes, expected key needs {}",
            report_data.len(),
            expected_public_key.len()
        ))
    })?;

    if !ct_eq(bound_key, expected_public_key) {
        tracing::warn!("quote report data does not bind the server key");
        return Err(QuoteError::ReportDataMismatch);
    }

    let expected_mrenclave = hex::decode(expected_mrenclave_hex)
        .map_err(|e| QuoteError::Malformed(format!("expected measurement: {e}")))?;

    if !ct_eq(&expected_mrenclave, quote.mrenclave()) {
        let measurement = hex::encode(quote.mrenclave());
        tracing::warn!(%measurement, "quote has unexpected code measurement");
        return Err(QuoteError::MeasurementMismatch { measurement });
    }

    if quote.is_debug() != policy.allow_debug_quotes {
        tracing::warn!(
            debug = quote.is_debug(),
            expected_debug = policy.allow_debug_quotes,
            "quote debug flag disagrees with policy"
        );
        return Err(QuoteError::DebugFlagMismatch {
            expected_debug: policy.allow_debug_quotes,
            actual_debug: quote.is_debug(),
        });
    }

    tracing::debug!(isv_svn = quote.isv_svn(), "quote verified");
    Ok(())
}

/// Parse raw quote bytes and verify them.
///
/// Structural parse failures are reported as [`QuoteError::Malformed`].
pub fn verify_raw_quote(
    raw_quote: &[u8],
    expected_public_key: &[u8],
    expected_mrenclave_hex: &str,
    policy: &AttestationPolicy,
) -> Result<Quote, QuoteError> {
    let quote = Quote::from_bytes(raw_quote)?;
    verify_quote(&quote, expected_public_key, expected_mrenclave_hex, policy)?;
    Ok(quote)
}
