//! The payment verifier state machine.
//!
//! `Pending -> {Valid, Invalid(reason), Unavailable}`: given a transaction
//! hash and an expected recipient (plus an expected amount for fixed-price
//! obligations), fetch the receipt, decode its `Transfer` events against the
//! chain's configured token contract, and settle on a verdict. Transient
//! chain failures surface as [`VerifierError::ChainUnavailable`] so they can
//! never be mistaken for a definitive negative.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, TxHash, U256};
use tracing::{debug, info, warn};

use crate::cache::VerificationCache;
use paylink::chain::{ChainAccessError, ChainId, ChainReader};
use paylink::verdict::{InvalidReason, VerificationResult};
use paylink_evm::decode::decode_transfers;
use paylink_evm::networks::TokenDeployment;

/// Errors that prevent the verifier from reaching a verdict.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifierError {
    /// The chain has no configured provider or token deployment.
    #[error("chain {0} is not supported")]
    UnsupportedChain(ChainId),

    /// The chain provider could not answer; the caller may retry. This is
    /// not a verdict and is never cached.
    #[error("chain unavailable: {0}")]
    ChainUnavailable(String),
}

impl From<ChainAccessError> for VerifierError {
    fn from(err: ChainAccessError) -> Self {
        match err {
            ChainAccessError::UnknownChain(chain) => Self::UnsupportedChain(chain),
            ChainAccessError::Unavailable { .. } => Self::ChainUnavailable(err.to_string()),
        }
    }
}

/// Verifies client-claimed payments against chain state.
pub struct PaymentVerifier {
    reader: Arc<dyn ChainReader>,
    cache: VerificationCache,
    tokens: HashMap<ChainId, TokenDeployment>,
}

impl std::fmt::Debug for PaymentVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentVerifier")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl PaymentVerifier {
    /// Creates a verifier over the given reader, verdict cache, and
    /// per-chain token deployments.
    #[must_use]
    pub fn new(
        reader: Arc<dyn ChainReader>,
        cache: VerificationCache,
        tokens: HashMap<ChainId, TokenDeployment>,
    ) -> Self {
        Self {
            reader,
            cache,
            tokens,
        }
    }

    /// Returns the token deployment verified against on a chain.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError::UnsupportedChain`] for unconfigured chains.
    pub fn token(&self, chain: ChainId) -> Result<TokenDeployment, VerifierError> {
        self.tokens
            .get(&chain)
            .copied()
            .ok_or(VerifierError::UnsupportedChain(chain))
    }

    /// Verifies that `tx_hash` carries a token transfer to
    /// `expected_recipient`, of exactly `expected_amount` when one is given
    /// (fixed-price items) or of any positive amount when not (open items).
    ///
    /// Definitive verdicts are cached by hash; a cache hit answers without
    /// touching the chain.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError`] when the chain cannot be consulted; that
    /// outcome is retryable and is never conflated with `Invalid`.
    pub async fn verify(
        &self,
        chain: ChainId,
        tx_hash: TxHash,
        expected_recipient: Address,
        expected_amount: Option<U256>,
    ) -> Result<VerificationResult, VerifierError> {
        if let Some(hit) = self.cache.get(&tx_hash) {
            debug!(chain, %tx_hash, valid = hit.is_valid(), "Verification cache hit");
            return Ok(hit);
        }

        let token = self.token(chain)?;

        let Some(receipt) = self.reader.receipt(chain, tx_hash).await? else {
            return Ok(self.settle(chain, tx_hash, InvalidReason::TransactionNotFound.into()));
        };
        if !receipt.status {
            return Ok(self.settle(chain, tx_hash, InvalidReason::TransactionReverted.into()));
        }

        // Recipient and amount are the load-bearing facts; a missing
        // timestamp must not abort verification.
        let timestamp = match self
            .reader
            .block_timestamp(chain, receipt.block_number)
            .await
        {
            Ok(timestamp) => timestamp,
            Err(err) => {
                warn!(chain, %tx_hash, block = receipt.block_number, %err,
                    "Block timestamp fetch failed; defaulting to 0");
                0
            }
        };

        let facts = decode_transfers(tx_hash, receipt.block_number, &receipt.logs, token.address);

        // First matching transfer wins; a well-formed payment transaction
        // carries exactly one transfer to the recipient. Zero-value
        // transfers are dust, never payment evidence.
        let matched = facts
            .into_iter()
            .find(|fact| fact.to == expected_recipient && fact.amount > U256::ZERO);
        let Some(fact) = matched else {
            return Ok(self.settle(chain, tx_hash, InvalidReason::NoTransferToRecipient.into()));
        };
        let fact = fact.with_timestamp(timestamp);

        if let Some(expected) = expected_amount
            && fact.amount != expected
        {
            return Ok(self.settle(
                chain,
                tx_hash,
                VerificationResult::Invalid(InvalidReason::AmountMismatch {
                    expected,
                    actual: fact.amount,
                }),
            ));
        }

        Ok(self.settle(chain, tx_hash, VerificationResult::Valid(fact)))
    }

    /// Caches and logs a definitive verdict.
    fn settle(
        &self,
        chain: ChainId,
        tx_hash: TxHash,
        result: VerificationResult,
    ) -> VerificationResult {
        match &result {
            VerificationResult::Valid(fact) => {
                info!(chain, %tx_hash, from = %fact.from, amount = %fact.amount,
                    block = fact.block_number, "Payment verified");
            }
            VerificationResult::Invalid(reason) => {
                info!(chain, %tx_hash, %reason, "Payment rejected");
            }
        }
        self.cache.put(tx_hash, result.clone());
        result
    }
}
