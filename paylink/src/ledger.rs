//! The payment ledger boundary.
//!
//! The ledger is the single source of truth for "already recorded" payments.
//! Real deployments implement [`PaymentLedger`] against their relational
//! store, where a unique index on the transaction hash enforces the
//! exactly-once invariant; [`MemoryLedger`] ships for tests and local runs
//! and enforces the same invariant with a first-writer-wins map entry.
//!
//! [`LedgerError::DuplicateTxHash`] is not a failure of intent: it signals
//! the payment is already recorded, and both recording paths convert it into
//! an idempotent success.

use crate::amount::serde_u256_dec;
use crate::item::PaymentItem;
use crate::time::UnixTimestamp;
use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// One confirmed, recorded payment. Created exactly once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// The item this payment satisfies.
    pub item_id: String,
    /// The paying wallet.
    pub payer: Address,
    /// Amount in the token's smallest unit.
    #[serde(with = "serde_u256_dec")]
    pub amount: U256,
    /// The on-chain transaction hash, globally unique across all payments.
    pub tx_hash: TxHash,
    /// When the row was created.
    pub recorded_at: UnixTimestamp,
}

/// The fields a caller supplies to record a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// The item the payment satisfies.
    pub item_id: String,
    /// The paying wallet.
    pub payer: Address,
    /// Amount in the token's smallest unit.
    pub amount: U256,
    /// The on-chain transaction hash.
    pub tx_hash: TxHash,
}

/// Errors from the ledger collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    /// A payment row for this transaction hash already exists.
    #[error("payment for transaction {0} already recorded")]
    DuplicateTxHash(TxHash),

    /// The backing store failed.
    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// Persistence operations the engine consumes.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Looks up a payment by its transaction hash.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] on store failure.
    async fn find_payment_by_tx_hash(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<Payment>, LedgerError>;

    /// Inserts a payment row.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateTxHash`] if a row for the same hash
    /// already exists (possibly written by a concurrent request), or
    /// [`LedgerError::Backend`] on store failure.
    async fn create_payment(&self, new: NewPayment) -> Result<Payment, LedgerError>;

    /// Lists all items whose payout wallet is `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] on store failure.
    async fn list_items_for_recipient(
        &self,
        recipient: Address,
    ) -> Result<Vec<PaymentItem>, LedgerError>;

    /// Looks up a single item by id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] on store failure.
    async fn find_item(&self, item_id: &str) -> Result<Option<PaymentItem>, LedgerError>;

    /// Returns the most recent payment a payer made for an item, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] on store failure.
    async fn find_latest_payment(
        &self,
        payer: Address,
        item_id: &str,
    ) -> Result<Option<Payment>, LedgerError>;
}

/// In-memory ledger for tests and local runs.
///
/// Uniqueness on the transaction hash is enforced atomically through the
/// map entry, so two concurrent [`create_payment`](PaymentLedger::create_payment)
/// calls for the same hash resolve to exactly one row.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    payments: DashMap<TxHash, Payment>,
    items: DashMap<String, PaymentItem>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an item. Items are owned by the surrounding
    /// application; this mirrors its CRUD at the test boundary.
    pub fn upsert_item(&self, item: PaymentItem) {
        self.items.insert(item.id.clone(), item);
    }

    /// Inserts a payment with an explicit `recorded_at`, for seeding and
    /// backfill imports.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateTxHash`] if the hash is taken.
    pub fn create_payment_at(
        &self,
        new: NewPayment,
        recorded_at: UnixTimestamp,
    ) -> Result<Payment, LedgerError> {
        match self.payments.entry(new.tx_hash) {
            dashmap::Entry::Occupied(_) => Err(LedgerError::DuplicateTxHash(new.tx_hash)),
            dashmap::Entry::Vacant(slot) => {
                let payment = Payment {
                    item_id: new.item_id,
                    payer: new.payer,
                    amount: new.amount,
                    tx_hash: new.tx_hash,
                    recorded_at,
                };
                slot.insert(payment.clone());
                Ok(payment)
            }
        }
    }

    /// Number of recorded payments.
    #[must_use]
    pub fn payment_count(&self) -> usize {
        self.payments.len()
    }
}

#[async_trait]
impl PaymentLedger for MemoryLedger {
    async fn find_payment_by_tx_hash(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<Payment>, LedgerError> {
        Ok(self.payments.get(&tx_hash).map(|p| p.value().clone()))
    }

    async fn create_payment(&self, new: NewPayment) -> Result<Payment, LedgerError> {
        self.create_payment_at(new, UnixTimestamp::now())
    }

    async fn list_items_for_recipient(
        &self,
        recipient: Address,
    ) -> Result<Vec<PaymentItem>, LedgerError> {
        Ok(self
            .items
            .iter()
            .filter(|entry| entry.recipient == recipient)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_item(&self, item_id: &str) -> Result<Option<PaymentItem>, LedgerError> {
        Ok(self.items.get(item_id).map(|i| i.value().clone()))
    }

    async fn find_latest_payment(
        &self,
        payer: Address,
        item_id: &str,
    ) -> Result<Option<Payment>, LedgerError> {
        Ok(self
            .payments
            .iter()
            .filter(|p| p.payer == payer && p.item_id == item_id)
            .max_by_key(|p| p.recorded_at)
            .map(|p| p.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use alloy_primitives::{B256, address};
    use std::sync::Arc;

    const PAYER: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
    const RECIPIENT: Address = address!("Ab5801a7D398351b8bE11C439e05C5B3259aeC9B");

    fn new_payment(tx_byte: u8) -> NewPayment {
        NewPayment {
            item_id: "itm_1".into(),
            payer: PAYER,
            amount: U256::from(5_000_000u64),
            tx_hash: B256::repeat_byte(tx_byte),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let ledger = MemoryLedger::new();
        let payment = ledger.create_payment(new_payment(1)).await.unwrap();
        let found = ledger
            .find_payment_by_tx_hash(B256::repeat_byte(1))
            .await
            .unwrap();
        assert_eq!(found, Some(payment));
        assert!(
            ledger
                .find_payment_by_tx_hash(B256::repeat_byte(2))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_tx_hash_rejected() {
        let ledger = MemoryLedger::new();
        ledger.create_payment(new_payment(1)).await.unwrap();
        let err = ledger.create_payment(new_payment(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateTxHash(_)));
        assert_eq!(ledger.payment_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_yield_one_row() {
        let ledger = Arc::new(MemoryLedger::new());
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.create_payment(new_payment(7)).await })
            })
            .collect();
        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(ledger.payment_count(), 1);
    }

    #[tokio::test]
    async fn test_latest_payment_wins() {
        let ledger = MemoryLedger::new();
        ledger
            .create_payment_at(new_payment(1), UnixTimestamp::from_secs(100))
            .unwrap();
        let mut second = new_payment(2);
        second.amount = U256::from(7_300_000u64);
        ledger
            .create_payment_at(second, UnixTimestamp::from_secs(200))
            .unwrap();

        let latest = ledger
            .find_latest_payment(PAYER, "itm_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.tx_hash, B256::repeat_byte(2));
    }

    #[tokio::test]
    async fn test_items_filtered_by_recipient() {
        let ledger = MemoryLedger::new();
        ledger.upsert_item(PaymentItem {
            id: "itm_1".into(),
            page_id: "pg_1".into(),
            title: "Print".into(),
            kind: ItemKind::Fixed {
                price: "5.00".into(),
            },
            recipient: RECIPIENT,
            chain: 8453,
            content_ref: None,
        });
        ledger.upsert_item(PaymentItem {
            id: "itm_2".into(),
            page_id: "pg_2".into(),
            title: "Tip".into(),
            kind: ItemKind::Open,
            recipient: PAYER,
            chain: 8453,
            content_ref: None,
        });

        let items = ledger.list_items_for_recipient(RECIPIENT).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "itm_1");
        assert!(ledger.find_item("itm_2").await.unwrap().is_some());
        assert!(ledger.find_item("missing").await.unwrap().is_none());
    }
}
