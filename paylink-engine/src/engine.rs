//! The engine facade the surrounding application calls.
//!
//! [`PaymentEngine`] wires the verifier, scanner, cache, and ledger together
//! behind the four operations the platform consumes: verify a claimed
//! payment, record one, check content access, and reconcile a block range.
//! All state is explicitly constructed and dependency-injected; the only
//! shared mutable structures are the concurrency-safe caches inside.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, TxHash, U256};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::access::{AccessDecision, FreshnessWindow};
use crate::cache::VerificationCache;
use crate::error::EngineError;
use crate::reconcile::{ReconciliationReport, reconcile_transfers};
use crate::verifier::{PaymentVerifier, VerifierError};
use paylink::chain::{ChainId, ChainReader};
use paylink::item::PaymentItem;
use paylink::ledger::{LedgerError, NewPayment, Payment, PaymentLedger};
use paylink::verdict::VerificationResult;
use paylink_evm::networks::TokenDeployment;
use paylink_evm::scan::TransferScanner;

/// Tunables for a [`PaymentEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Time-to-live for cached verification verdicts.
    pub cache_ttl: Duration,
    /// Trailing window during which recorded payments are trusted without
    /// re-verification on access checks.
    pub freshness_window: Duration,
    /// Look-back window for unbounded reconciliation scans, in blocks.
    pub scan_lookback: u64,
    /// Token deployment verified against, per chain.
    pub tokens: HashMap<ChainId, TokenDeployment>,
}

/// Outcome of recording a client-submitted payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    /// The payment row now on the ledger.
    pub payment: Payment,
    /// Whether the row already existed (idempotent re-submission).
    pub already_recorded: bool,
}

/// The payment verification and reconciliation engine.
pub struct PaymentEngine {
    verifier: PaymentVerifier,
    scanner: TransferScanner,
    ledger: Arc<dyn PaymentLedger>,
    cache: VerificationCache,
    freshness: FreshnessWindow,
}

impl std::fmt::Debug for PaymentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentEngine")
            .field("verifier", &self.verifier)
            .field("freshness", &self.freshness)
            .finish_non_exhaustive()
    }
}

impl PaymentEngine {
    /// Assembles an engine over a chain reader and a payment ledger.
    #[must_use]
    pub fn new(
        reader: Arc<dyn ChainReader>,
        ledger: Arc<dyn PaymentLedger>,
        options: EngineOptions,
    ) -> Self {
        let cache = VerificationCache::new(options.cache_ttl);
        let verifier = PaymentVerifier::new(
            Arc::clone(&reader),
            cache.clone(),
            options.tokens,
        );
        let scanner = TransferScanner::new(reader, options.scan_lookback);
        Self {
            verifier,
            scanner,
            ledger,
            cache,
            freshness: FreshnessWindow::new(options.freshness_window),
        }
    }

    /// Starts the periodic cache sweep, tied to `shutdown`.
    pub fn spawn_cache_sweeper(
        &self,
        every: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        self.cache.spawn_sweeper(every, shutdown)
    }

    /// Verifies that a transaction pays `recipient`, of exactly
    /// `expected_amount` smallest units when given.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the chain cannot be consulted or is not
    /// configured; definitive verdicts (including negative ones) are values.
    pub async fn verify_payment(
        &self,
        chain: ChainId,
        tx_hash: TxHash,
        recipient: Address,
        expected_amount: Option<U256>,
    ) -> Result<VerificationResult, EngineError> {
        Ok(self
            .verifier
            .verify(chain, tx_hash, recipient, expected_amount)
            .await?)
    }

    /// Records a client-submitted payment for an item after independently
    /// verifying it on-chain.
    ///
    /// Recording is idempotent on the transaction hash: a duplicate
    /// submission (sequential or concurrent) completes successfully and
    /// reports the existing row.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::VerificationFailed`] when the transaction does
    /// not prove the payment, and [`EngineError`] variants for unknown
    /// items, unsupported chains, chain outages, and ledger failures.
    pub async fn record_payment(
        &self,
        item_id: &str,
        tx_hash: TxHash,
    ) -> Result<RecordOutcome, EngineError> {
        let item = self.require_item(item_id).await?;
        let expected = self.expected_amount(&item)?;

        // Check-before-write; the ledger's uniqueness constraint is the
        // actual guarantee under concurrency.
        if let Some(existing) = self.ledger.find_payment_by_tx_hash(tx_hash).await? {
            debug!(%tx_hash, item_id, "Payment already recorded");
            return Ok(RecordOutcome {
                payment: existing,
                already_recorded: true,
            });
        }

        let result = self
            .verifier
            .verify(item.chain, tx_hash, item.recipient, expected)
            .await?;
        let fact = match result {
            VerificationResult::Valid(fact) => fact,
            VerificationResult::Invalid(reason) => {
                return Err(EngineError::VerificationFailed(reason));
            }
        };

        match self
            .ledger
            .create_payment(NewPayment {
                item_id: item.id.clone(),
                payer: fact.from,
                amount: fact.amount,
                tx_hash,
            })
            .await
        {
            Ok(payment) => Ok(RecordOutcome {
                payment,
                already_recorded: false,
            }),
            Err(LedgerError::DuplicateTxHash(_)) => {
                // Lost the race to a concurrent writer; surface its row.
                let payment = self
                    .ledger
                    .find_payment_by_tx_hash(tx_hash)
                    .await?
                    .ok_or_else(|| {
                        LedgerError::Backend("duplicate reported but row not found".into())
                    })?;
                Ok(RecordOutcome {
                    payment,
                    already_recorded: true,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Decides whether `payer` has access to the content of `item_id`.
    ///
    /// The most recent payment row for the pair is consulted; rows inside
    /// the freshness window grant access without RPC, older rows are
    /// re-verified on-chain.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for unknown items, chain outages (retryable,
    /// never a denial), and ledger failures.
    pub async fn check_access(
        &self,
        payer: Address,
        item_id: &str,
    ) -> Result<AccessDecision, EngineError> {
        let item = self.require_item(item_id).await?;

        let Some(payment) = self.ledger.find_latest_payment(payer, item_id).await? else {
            return Ok(AccessDecision::denied("no payment recorded for this item"));
        };

        if self.freshness.covers(&payment) {
            debug!(%payer, item_id, tx_hash = %payment.tx_hash,
                "Access granted inside freshness window");
            return Ok(AccessDecision::granted());
        }

        let expected = self.expected_amount(&item)?;
        match self
            .verifier
            .verify(item.chain, payment.tx_hash, item.recipient, expected)
            .await?
        {
            VerificationResult::Valid(_) => Ok(AccessDecision::granted()),
            VerificationResult::Invalid(reason) => Ok(AccessDecision::denied(reason.to_string())),
        }
    }

    /// Scans a block range for transfers to `recipient` and reconciles them
    /// against the recipient's items.
    ///
    /// Omitted bounds default to a trailing window ending at the chain head.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the scan itself cannot run; per-transfer
    /// problems are absorbed into the report instead.
    pub async fn scan_and_reconcile(
        &self,
        chain: ChainId,
        recipient: Address,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<ReconciliationReport, EngineError> {
        let token = self.verifier.token(chain)?;
        let transfers = self
            .scanner
            .scan_transfers_to(chain, token.address, recipient, from_block, to_block)
            .await
            .map_err(VerifierError::from)?;
        let items = self.ledger.list_items_for_recipient(recipient).await?;
        Ok(reconcile_transfers(self.ledger.as_ref(), token.decimals, transfers, &items).await)
    }

    async fn require_item(&self, item_id: &str) -> Result<PaymentItem, EngineError> {
        self.ledger
            .find_item(item_id)
            .await?
            .ok_or_else(|| EngineError::UnknownItem(item_id.to_owned()))
    }

    fn expected_amount(&self, item: &PaymentItem) -> Result<Option<U256>, EngineError> {
        let token = self.verifier.token(item.chain)?;
        item.expected_amount(token.decimals)
            .map_err(|source| EngineError::BadItemPrice {
                item_id: item.id.clone(),
                source,
            })
    }
}
