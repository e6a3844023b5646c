//! Core types for the paylink payment verification engine.
//!
//! A creator defines payable items (fixed price or open amount) and a
//! customer pays in a stablecoin on a specific chain. This crate holds the
//! domain vocabulary shared by the chain-access and engine crates:
//!
//! - [`amount`] - lossless conversion between decimal price strings and
//!   smallest-unit integer amounts
//! - [`chain`] - chain identifiers and the [`ChainReader`](chain::ChainReader)
//!   seam the engine verifies through
//! - [`item`] - payable items ([`PaymentItem`](item::PaymentItem))
//! - [`transfer`] - chain-confirmed transfer facts
//! - [`verdict`] - verification results and failure reasons
//! - [`ledger`] - the payment ledger boundary and its in-memory implementation
//!
//! All economic comparisons happen on [`alloy_primitives::U256`] in the
//! token's smallest unit; floating point never touches money.

pub mod amount;
pub mod chain;
pub mod item;
pub mod ledger;
pub mod time;
pub mod transfer;
pub mod verdict;

pub use amount::{MalformedAmount, to_decimal_string, to_smallest_unit};
pub use chain::{ChainAccessError, ChainId, ChainReader, RawTransferLog, ReceiptFacts};
pub use item::{ItemKind, PaymentItem};
pub use ledger::{LedgerError, MemoryLedger, NewPayment, Payment, PaymentLedger};
pub use time::UnixTimestamp;
pub use transfer::TransferFact;
pub use verdict::{InvalidReason, VerificationResult};
