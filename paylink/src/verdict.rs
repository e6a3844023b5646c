//! Verification verdicts.
//!
//! A [`VerificationResult`] is the terminal answer for one
//! `(tx hash, expected recipient, optional expected amount)` query. It is
//! never mutated after creation; callers re-verify by issuing a new query.
//! Transient chain failures are *not* a verdict - they surface as errors on
//! the verifying call so they can never be conflated with invalidity.

use crate::transfer::TransferFact;
use alloy_primitives::U256;
use std::fmt;

/// A definitive negative verdict, safe to show to the payer.
///
/// Each variant implies a different corrective action, so the `Display`
/// strings distinguish them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The chain does not know the transaction hash.
    TransactionNotFound,
    /// The transaction was included but reverted.
    TransactionReverted,
    /// The transaction succeeded but moved no tokens to the expected
    /// recipient.
    NoTransferToRecipient,
    /// A transfer to the recipient exists but its amount is wrong.
    AmountMismatch {
        /// Amount the obligation requires, smallest units.
        expected: U256,
        /// Amount actually observed on-chain, smallest units.
        actual: U256,
    },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransactionNotFound => write!(f, "transaction not found"),
            Self::TransactionReverted => write!(f, "transaction failed or reverted"),
            Self::NoTransferToRecipient => {
                write!(f, "no transfer found to expected recipient")
            }
            Self::AmountMismatch { expected, actual } => {
                write!(f, "amount mismatch: expected {expected}, got {actual}")
            }
        }
    }
}

/// The verdict for one verification query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// A matching transfer was confirmed on-chain.
    Valid(TransferFact),
    /// The payment is definitively not valid for the queried obligation.
    Invalid(InvalidReason),
}

impl From<InvalidReason> for VerificationResult {
    fn from(reason: InvalidReason) -> Self {
        Self::Invalid(reason)
    }
}

impl VerificationResult {
    /// Whether the verdict is positive.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The confirmed transfer fact, when valid.
    #[must_use]
    pub const fn fact(&self) -> Option<&TransferFact> {
        match self {
            Self::Valid(fact) => Some(fact),
            Self::Invalid(_) => None,
        }
    }

    /// The failure reason, when invalid.
    #[must_use]
    pub const fn invalid_reason(&self) -> Option<&InvalidReason> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}
