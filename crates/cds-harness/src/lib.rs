//! Deterministic fixtures for contact discovery trust testing.
//!
//! Provides a seeded [`Environment`](cds_core::Environment) with a settable
//! clock, a builder for structurally valid quotes, and a throwaway
//! attestation authority that issues certificates and signs report bodies,
//! and the enclave end of the session cipher.
//!
//! # Example
//!
//! ```rust,ignore
//! let env = SimEnv::with_seed(7);
//! let authority = TestAuthority::new()?;
//! let quote = QuoteBuilder::new().report_data(&server_key).build();
//! let bundle = authority.attest(&quote, &ReportTemplate::ok(env.now()))?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authority;
mod enclave;
mod error;
mod quote_builder;
mod sim_env;

pub use authority::{ReportTemplate, TestAuthority};
pub use enclave::SimEnclave;
pub use error::HarnessError;
pub use quote_builder::QuoteBuilder;
pub use sim_env::SimEnv;
