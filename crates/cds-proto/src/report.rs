//! Attestation authority report body.
//!
//! The authority returns a JSON document describing its verdict on a quote,
//! signed over the exact bytes of that document. Only the fields the client
//! acts on are required; everything else is carried for diagnostics.

use std::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;

use crate::ProtoError;

/// Verdict the attestation authority reached about a quote.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuoteStatus {
    /// Quote verified and platform is up to date.
    Ok,
    /// Quote signature did not verify.
    SignatureInvalid,
    /// Platform EPID group has been revoked.
    GroupRevoked,
    /// Quote signature has been revoked.
    SignatureRevoked,
    /// Platform attestation key has been revoked.
    KeyRevoked,
    /// Signature revocation list version did not match.
    SigrlVersionMismatch,
    /// Platform TCB level is out of date.
    GroupOutOfDate,
    /// Platform needs additional configuration.
    ConfigurationNeeded,
    /// Enclave needs software hardening.
    SwHardeningNeeded,
    /// Platform needs configuration and the enclave software hardening.
    ConfigurationAndSwHardeningNeeded,
    /// A status string this client does not know.
    Other(String),
}

impl QuoteStatus {
    /// Canonical wire spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::GroupRevoked => "GROUP_REVOKED",
            Self::SignatureRevoked => "SIGNATURE_REVOKED",
            Self::KeyRevoked => "KEY_REVOKED",
            Self::SigrlVersionMismatch => "SIGRL_VERSION_MISMATCH",
            Self::GroupOutOfDate => "GROUP_OUT_OF_DATE",
            Self::ConfigurationNeeded => "CONFIGURATION_NEEDED",
            Self::SwHardeningNeeded => "SW_HARDENING_NEEDED",
            Self::ConfigurationAndSwHardeningNeeded => "CONFIGURATION_AND_SW_HARDENING_NEEDED",
            Self::Other(status) => status,
        }
    }
}

impl From<&str> for QuoteStatus {
    fn from(status: &str) -> Self {
        match status {
            "OK" => Self::Ok,
            "SIGNATURE_INVALID" => Self::SignatureInvalid,
            "GROUP_REVOKED" => Self::GroupRevoked,
            "SIGNATURE_REVOKED" => Self::SignatureRevoked,
            "KEY_REVOKED" => Self::KeyRevoked,
            "SIGRL_VERSION_MISMATCH" => Self::SigrlVersionMismatch,
            "GROUP_OUT_OF_DATE" => Self::GroupOutOfDate,
            "CONFIGURATION_NEEDED" => Self::ConfigurationNeeded,
            "SW_HARDENING_NEEDED" => Self::SwHardeningNeeded,
            "CONFIGURATION_AND_SW_HARDENING_NEEDED" => Self::ConfigurationAndSwHardeningNeeded,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for QuoteStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON shape of the report body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody {
    #[serde(default)]
    id: String,
    timestamp: String,
    #[serde(default)]
    version: Option<u32>,
    isv_enclave_quote_status: String,
    isv_enclave_quote_body: String,
    #[serde(default)]
    platform_info_blob: Option<String>,
    #[serde(default, rename = "advisoryURL")]
    advisory_url: Option<String>,
    #[serde(default, rename = "advisoryIDs")]
    advisory_ids: Vec<String>,
    #[serde(default)]
    nonce: Option<String>,
}

/// Parsed attestation authority report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedReport {
    /// Report identifier assigned by the authority.
    pub id: String,
    /// Issue time, `yyyy-MM-ddTHH:mm:ss.ffffff` in UTC, as received.
    pub timestamp: String,
    /// Report format version, if present.
    pub version: Option<u32>,
    /// Status string as received.
    pub status: String,
    /// Copy of the quote the authority evaluated (base64-decoded).
    pub quote_body: Vec<u8>,
    /// Platform info blob (hex), present for some non-OK statuses.
    pub platform_info_blob: Option<String>,
    /// URL describing the listed advisories.
    pub advisory_url: Option<String>,
    /// Security advisories affecting the platform.
    pub advisory_ids: Vec<String>,
    /// Nonce echoed from the attestation request.
    pub nonce: Option<String>,
}

impl SignedReport {
    /// Parse the exact report body bytes the authority signed.
    pub fn from_json(body: &[u8]) -> Result<Self, ProtoError> {
        let raw: ReportBody =
            serde_json::from_slice(body).map_err(|e| ProtoError::MalformedJson(e.to_string()))?;

        let quote_body = STANDARD
            .decode(raw.isv_enclave_quote_body.as_bytes())
            .map_err(|e| ProtoError::MalformedQuoteBody(e.to_string()))?;

        Ok(Self {
            id: raw.id,
            timestamp: raw.timestamp,
            version: raw.version,
            status: raw.isv_enclave_quote_status,
            quote_body,
            platform_info_blob: raw.platform_info_blob,
            advisory_url: raw.advisory_url,
            advisory_ids: raw.advisory_ids,
            nonce: raw.nonce,
        })
    }

    /// Status as a typed value.
    pub fn quote_status(&self) -> QuoteStatus {
        QuoteStatus::from(self.status.as_str())
    }
}
