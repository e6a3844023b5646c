//! Payment verification and reconciliation service for paylink.
//!
//! The engine proves, independently of the client's say-so, that a claimed
//! stablecoin payment actually happened on-chain - right recipient, right
//! amount when the item fixes one - and records it exactly once. It also
//! runs reconciliation sweeps that match unrecorded on-chain transfers to a
//! creator's payment items after the fact.
//!
//! # Architecture
//!
//! - [`verifier`] - the receipt-fetch -> decode -> match state machine
//! - [`cache`] - TTL memoization of definitive verdicts
//! - [`access`] - content access decisions with the trust-recent-writes
//!   freshness window
//! - [`reconcile`] - matching scanned transfers to fixed and open items
//! - [`engine`] - the facade tying the above to a
//!   [`PaymentLedger`](paylink::ledger::PaymentLedger)
//! - [`config`] / [`handlers`] - TOML configuration and the HTTP surface

pub mod access;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod reconcile;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use access::{AccessDecision, FreshnessWindow};
pub use cache::VerificationCache;
pub use config::EngineConfig;
pub use engine::{EngineOptions, PaymentEngine, RecordOutcome};
pub use error::EngineError;
pub use reconcile::{ReconciliationReport, ReconciliationSummary};
pub use verifier::{PaymentVerifier, VerifierError};
