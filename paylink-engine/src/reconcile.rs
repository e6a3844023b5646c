//! Reconciliation of scanned transfers against payment items.
//!
//! Fixed-price matching is unambiguous - the amount is the key - so it is
//! fully automated. Open-amount matching is inherently ambiguous from chain
//! data alone (nothing says which open item, or which intent, a 7.30 tip
//! satisfies), so open candidates are surfaced for manual attribution and
//! never auto-recorded.
//!
//! The matcher surfaces partial results: a ledger hiccup or malformed stored
//! price affects only the transfer or item at hand, never the whole sweep.

use alloy_primitives::U256;
use serde::Serialize;
use tracing::{debug, info, warn};

use paylink::amount::to_smallest_unit;
use paylink::item::{ItemKind, PaymentItem};
use paylink::ledger::{LedgerError, NewPayment, Payment, PaymentLedger};
use paylink::transfer::TransferFact;

/// A transfer automatically attributed to a fixed-price item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedTransfer {
    /// The on-chain transfer.
    pub transfer: TransferFact,
    /// The fixed item it satisfies.
    pub item_id: String,
    /// The payment row created for it.
    pub payment: Payment,
}

/// A transfer that matched no fixed price but could satisfy an open item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenCandidate {
    /// The on-chain transfer.
    pub transfer: TransferFact,
    /// Open items it could be manually attributed to.
    pub candidate_item_ids: Vec<String>,
}

/// Outcome of one reconciliation sweep, for operator and creator review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    /// Transfers auto-matched to fixed items; one payment row each.
    pub matched: Vec<MatchedTransfer>,
    /// Transfers awaiting manual attribution to an open item.
    pub unmatched_with_candidate: Vec<OpenCandidate>,
    /// Transfers matching nothing the recipient offers.
    pub unmatched: Vec<TransferFact>,
    /// Transfers skipped because a payment row already existed.
    pub already_recorded: usize,
}

/// Per-bucket counts of a [`ReconciliationReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    /// Count of auto-matched transfers.
    pub matched: usize,
    /// Count of open-item candidates.
    pub unmatched_with_candidate: usize,
    /// Count of fully unmatched transfers.
    pub unmatched: usize,
    /// Count of transfers already recorded.
    pub already_recorded: usize,
}

impl ReconciliationReport {
    /// Returns the per-bucket counts.
    #[must_use]
    pub fn summary(&self) -> ReconciliationSummary {
        ReconciliationSummary {
            matched: self.matched.len(),
            unmatched_with_candidate: self.unmatched_with_candidate.len(),
            unmatched: self.unmatched.len(),
            already_recorded: self.already_recorded,
        }
    }
}

/// Matches scanned transfers to one recipient's items, in scan order.
///
/// Per transfer: skip if a payment row already exists; otherwise the first
/// fixed item whose smallest-unit price equals the amount wins and a payment
/// is created (a concurrent `DuplicateTxHash` counts as already recorded);
/// otherwise the transfer is surfaced as an open candidate when the
/// recipient has open items, or as unmatched when it has none.
pub async fn reconcile_transfers(
    ledger: &dyn PaymentLedger,
    token_decimals: u8,
    transfers: Vec<TransferFact>,
    items: &[PaymentItem],
) -> ReconciliationReport {
    // Resolve fixed prices once, in stable item order. An item with a
    // malformed stored price is skipped, not fatal to the sweep.
    let fixed: Vec<(&PaymentItem, U256)> = items
        .iter()
        .filter_map(|item| match &item.kind {
            ItemKind::Fixed { price } => match to_smallest_unit(price, token_decimals) {
                Ok(expected) => Some((item, expected)),
                Err(err) => {
                    warn!(item_id = %item.id, %err, "Skipping fixed item with malformed price");
                    None
                }
            },
            ItemKind::Open => None,
        })
        .collect();
    let open_ids: Vec<String> = items
        .iter()
        .filter(|item| matches!(item.kind, ItemKind::Open))
        .map(|item| item.id.clone())
        .collect();

    let mut report = ReconciliationReport::default();

    for transfer in transfers {
        match ledger.find_payment_by_tx_hash(transfer.tx_hash).await {
            Ok(Some(_)) => {
                debug!(tx_hash = %transfer.tx_hash, "Transfer already recorded");
                report.already_recorded += 1;
                continue;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(tx_hash = %transfer.tx_hash, %err, "Ledger lookup failed; leaving transfer unmatched");
                report.unmatched.push(transfer);
                continue;
            }
        }

        let fixed_match = fixed
            .iter()
            .find(|(_, expected)| *expected == transfer.amount);
        if let Some((item, _)) = fixed_match {
            match ledger
                .create_payment(NewPayment {
                    item_id: item.id.clone(),
                    payer: transfer.from,
                    amount: transfer.amount,
                    tx_hash: transfer.tx_hash,
                })
                .await
            {
                Ok(payment) => {
                    info!(tx_hash = %transfer.tx_hash, item_id = %item.id, amount = %transfer.amount,
                        "Reconciled transfer to fixed item");
                    report.matched.push(MatchedTransfer {
                        transfer,
                        item_id: item.id.clone(),
                        payment,
                    });
                }
                Err(LedgerError::DuplicateTxHash(_)) => {
                    // A concurrent writer recorded it first; same outcome.
                    report.already_recorded += 1;
                }
                Err(err) => {
                    warn!(tx_hash = %transfer.tx_hash, %err, "Payment insert failed; leaving transfer unmatched");
                    report.unmatched.push(transfer);
                }
            }
            continue;
        }

        if open_ids.is_empty() {
            report.unmatched.push(transfer);
        } else {
            report.unmatched_with_candidate.push(OpenCandidate {
                transfer,
                candidate_item_ids: open_ids.clone(),
            });
        }
    }

    report
}
