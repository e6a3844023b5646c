//! Chain identifiers and the read seam against chain providers.
//!
//! The engine never talks JSON-RPC directly; it goes through [`ChainReader`],
//! which the EVM crate implements over alloy providers and tests implement
//! with scripted doubles. The trait is deliberately small: a receipt, a block
//! timestamp, the chain head, and a filtered `Transfer` log query are the
//! only chain facts verification and reconciliation need.

use alloy_primitives::{Address, Log, TxHash};
use async_trait::async_trait;

/// An EIP-155 chain ID (e.g., 8453 for Base, 137 for Polygon).
pub type ChainId = u64;

/// The receipt facts verification needs, detached from any provider type.
///
/// `logs` carries the raw event logs of the transaction; the transfer
/// decoder extracts token movements from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFacts {
    /// Whether the transaction executed successfully.
    pub status: bool,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// All event logs emitted by the transaction.
    pub logs: Vec<Log>,
}

/// A raw log returned by a `Transfer` scan, with its emitting transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransferLog {
    /// Transaction that emitted the log.
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// The raw log itself.
    pub log: Log,
}

/// Errors from the chain access layer.
///
/// `Unavailable` means "unknown - retry or fail the enclosing request"; it
/// must never be interpreted as proof that a transaction is invalid.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainAccessError {
    /// No provider is configured for the chain.
    #[error("chain {0} is not configured")]
    UnknownChain(ChainId),

    /// Transient provider failure: timeout, connection error, rate limit.
    #[error("chain {chain} unavailable: {reason}")]
    Unavailable {
        /// The chain the call targeted.
        chain: ChainId,
        /// Human-readable provider failure description.
        reason: String,
    },
}

/// Read-only access to chain state, one implementation per provider family.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Fetches the receipt for a transaction hash.
    ///
    /// Returns `Ok(None)` when the chain does not know the transaction,
    /// which is a definitive answer, distinct from a fetch failure.
    ///
    /// # Errors
    ///
    /// Returns [`ChainAccessError`] on provider failure or unknown chain.
    async fn receipt(
        &self,
        chain: ChainId,
        tx_hash: TxHash,
    ) -> Result<Option<ReceiptFacts>, ChainAccessError>;

    /// Fetches the timestamp (unix seconds) of a block.
    ///
    /// # Errors
    ///
    /// Returns [`ChainAccessError`] on provider failure or unknown chain.
    async fn block_timestamp(&self, chain: ChainId, number: u64)
    -> Result<u64, ChainAccessError>;

    /// Returns the current chain head block number.
    ///
    /// # Errors
    ///
    /// Returns [`ChainAccessError`] on provider failure or unknown chain.
    async fn head_block(&self, chain: ChainId) -> Result<u64, ChainAccessError>;

    /// Queries `Transfer` logs emitted by `token` and addressed to `to`
    /// across an inclusive block range.
    ///
    /// # Errors
    ///
    /// Returns [`ChainAccessError`] on provider failure or unknown chain.
    async fn transfer_logs(
        &self,
        chain: ChainId,
        token: Address,
        to: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawTransferLog>, ChainAccessError>;
}
