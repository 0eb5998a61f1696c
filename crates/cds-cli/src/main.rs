//! `cds-verify` binary.
//!
//! # Usage
//!
//! ```bash
//! # Production enclave, OK status only
//! cds-verify --quote quote.bin --report report.json --signature report.sig \
//!     --chain chain.pem --trust-store roots.pem \
//!     --mrenclave <hex> --server-key <hex>
//!
//! # Staging enclave built in debug mode
//! cds-verify ... --allow-debug --allow-group-out-of-date
//! ```

use cds_cli::{Args, run};
use cds_core::SystemEnv;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    if args.allow_debug {
        tracing::warn!("expecting a debug enclave; its memory is readable by the host");
    }

    match run(&args, SystemEnv::new()) {
        Ok(verified) => {
            tracing::info!(
                mrenclave = %hex::encode(verified.quote.mrenclave()),
                isv_svn = verified.quote.isv_svn(),
                status = %verified.report.status,
                timestamp = %verified.report.timestamp,
                advisories = ?verified.report.advisory_ids,
                "attestation accepted"
            );
            Ok(())
        },
        Err(e) => {
            tracing::error!("attestation rejected: {}", e);
            Err(e.into())
        },
    }
}
