//! Offline attestation verification.
//!
//! Loads evidence captured from the contact discovery service and runs it
//! through [`AttestationVerifier`] under a policy assembled from flags. The
//! `cds-verify` binary is a thin wrapper around [`run`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use cds_core::{
    AttestationBundle, AttestationPolicy, AttestationVerifier, Environment, TrustConfig,
    TrustStore, VerifiedAttestation, WebPkiValidator,
};
use cds_proto::QuoteStatus;
use clap::Parser;
pub use error::CliError;

/// Verify enclave attestation evidence
#[derive(Parser, Debug, Clone)]
#[command(name = "cds-verify")]
#[command(about = "Verify contact discovery enclave attestation evidence")]
#[command(version)]
pub struct Args {
    /// Raw quote bytes
    #[arg(long)]
    pub quote: PathBuf,

    /// Signed report body, exactly as received
    #[arg(long)]
    pub report: PathBuf,

    /// Report signature, base64
    #[arg(long)]
    pub signature: PathBuf,

    /// Authority certificate chain (PEM, leaf first)
    #[arg(long)]
    pub chain: PathBuf,

    /// Trusted root certificates (PEM)
    #[arg(long)]
    pub trust_store: PathBuf,

    /// Expected code measurement, hex
    #[arg(long)]
    pub mrenclave: String,

    /// Server static public key the quote must bind, hex
    #[arg(long)]
    pub server_key: String,

    /// Expect a debug enclave instead of a production one
    #[arg(long)]
    pub allow_debug: bool,

    /// Accept GROUP_OUT_OF_DATE reports
    #[arg(long)]
    pub allow_group_out_of_date: bool,

    /// Maximum report age in seconds
    #[arg(long, default_value = "86400")]
    pub freshness_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Policy: strict, loosened only by explicit flags.
    pub fn policy(&self) -> AttestationPolicy {
        let mut policy = AttestationPolicy::strict()
            .with_allow_debug_quotes(self.allow_debug)
            .with_freshness_window(Duration::from_secs(self.freshness_secs));
        if self.allow_group_out_of_date {
            policy = policy.allow_status(QuoteStatus::GroupOutOfDate);
        }
        policy
    }

    /// Build the trust configuration.
    pub fn trust_config(&self) -> Result<TrustConfig, CliError> {
        let trust_store = TrustStore::from_pem(&read(&self.trust_store)?)?;
        let server_key = hex::decode(self.server_key.trim())
            .map_err(|e| CliError::Hex { what: "server key", reason: e.to_string() })?;
        hex::decode(self.mrenclave.trim())
            .map_err(|e| CliError::Hex { what: "mrenclave", reason: e.to_string() })?;

        Ok(TrustConfig::new(trust_store, self.mrenclave.trim(), server_key)
            .with_policy(self.policy()))
    }

    /// Load the evidence files.
    pub fn bundle(&self) -> Result<AttestationBundle, CliError> {
        let signature_text = read(&self.signature)?;
        let signature = STANDARD
            .decode(signature_text.trim_ascii())
            .map_err(|e| CliError::Base64(e.to_string()))?;
        let certificates =
            String::from_utf8(read(&self.chain)?).map_err(|_| CliError::ChainEncoding)?;

        Ok(AttestationBundle {
            quote: read(&self.quote)?,
            certificates,
            signature_body: read(&self.report)?,
            signature,
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}

/// Load everything named by `args` and verify it at `env.now()`.
pub fn run<E: Environment>(args: &Args, env: E) -> Result<VerifiedAttestation, CliError> {
    let config = args.trust_config()?;
    tracing::debug!(?config, "trust configuration loaded");

    let bundle = args.bundle()?;
    let verifier = AttestationVerifier::new(config, WebPkiValidator::new(), env);
    Ok(verifier.verify(&bundle)?)
}
