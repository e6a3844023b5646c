//! Block-range `Transfer` scans for reconciliation sweeps.
//!
//! A scan answers "which token transfers reached this recipient in this
//! block range", independent of any client-submitted hash. Timestamps are
//! left unresolved per event to avoid one block fetch per transfer; block
//! numbers are returned and downstream consumers resolve timestamps lazily
//! if they need them.

use std::sync::Arc;

use alloy_primitives::Address;
use tracing::debug;

use crate::decode::decode_transfer;
use paylink::chain::{ChainAccessError, ChainId, ChainReader};
use paylink::transfer::TransferFact;

/// Default look-back window when the caller omits scan bounds.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 10_000;

/// Scans a chain for `Transfer` events addressed to a recipient.
pub struct TransferScanner {
    reader: Arc<dyn ChainReader>,
    lookback: u64,
}

impl std::fmt::Debug for TransferScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferScanner")
            .field("lookback", &self.lookback)
            .finish_non_exhaustive()
    }
}

impl TransferScanner {
    /// Creates a scanner with the given look-back window for unbounded scans.
    #[must_use]
    pub fn new(reader: Arc<dyn ChainReader>, lookback: u64) -> Self {
        Self { reader, lookback }
    }

    /// Scans for transfers of `token` to `recipient` across a block range.
    ///
    /// When bounds are omitted, `to` defaults to the current chain head and
    /// `from` to `to - lookback`, bounding scan cost; explicit bounds
    /// override. Zero transfers is a success with an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`ChainAccessError`] when the provider cannot be reached.
    pub async fn scan_transfers_to(
        &self,
        chain: ChainId,
        token: Address,
        recipient: Address,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Vec<TransferFact>, ChainAccessError> {
        let to_block = match to_block {
            Some(block) => block,
            None => self.reader.head_block(chain).await?,
        };
        let from_block = from_block.unwrap_or_else(|| to_block.saturating_sub(self.lookback));

        let raw_logs = self
            .reader
            .transfer_logs(chain, token, recipient, from_block, to_block)
            .await?;

        let facts: Vec<TransferFact> = raw_logs
            .iter()
            .filter_map(|raw| {
                decode_transfer(&raw.log).map(|transfer| TransferFact {
                    tx_hash: raw.tx_hash,
                    from: transfer.from,
                    to: transfer.to,
                    amount: transfer.value,
                    block_number: raw.block_number,
                    block_timestamp: 0,
                })
            })
            .filter(|fact| fact.to == recipient)
            .collect();

        debug!(
            chain,
            %recipient,
            from_block,
            to_block,
            transfers = facts.len(),
            "Transfer scan complete"
        );
        Ok(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::IERC20;
    use alloy_primitives::{B256, Log, TxHash, U256, address};
    use alloy_sol_types::SolEvent;
    use async_trait::async_trait;
    use paylink::chain::{RawTransferLog, ReceiptFacts};
    use std::sync::Mutex;

    const TOKEN: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
    const RECIPIENT: Address = address!("Ab5801a7D398351b8bE11C439e05C5B3259aeC9B");
    const SENDER: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

    struct ScriptedReader {
        head: u64,
        logs: Vec<RawTransferLog>,
        seen_range: Mutex<Option<(u64, u64)>>,
    }

    #[async_trait]
    impl ChainReader for ScriptedReader {
        async fn receipt(
            &self,
            _chain: ChainId,
            _tx_hash: TxHash,
        ) -> Result<Option<ReceiptFacts>, ChainAccessError> {
            unreachable!("scans never fetch receipts")
        }

        async fn block_timestamp(
            &self,
            _chain: ChainId,
            _number: u64,
        ) -> Result<u64, ChainAccessError> {
            unreachable!("scans never fetch blocks")
        }

        async fn head_block(&self, _chain: ChainId) -> Result<u64, ChainAccessError> {
            Ok(self.head)
        }

        async fn transfer_logs(
            &self,
            _chain: ChainId,
            _token: Address,
            _to: Address,
            from_block: u64,
            to_block: u64,
        ) -> Result<Vec<RawTransferLog>, ChainAccessError> {
            *self.seen_range.lock().unwrap() = Some((from_block, to_block));
            Ok(self.logs.clone())
        }
    }

    fn raw_transfer(tx_byte: u8, block: u64, to: Address, value: u64) -> RawTransferLog {
        RawTransferLog {
            tx_hash: B256::repeat_byte(tx_byte),
            block_number: block,
            log: Log {
                address: TOKEN,
                data: IERC20::Transfer {
                    from: SENDER,
                    to,
                    value: U256::from(value),
                }
                .encode_log_data(),
            },
        }
    }

    #[tokio::test]
    async fn test_default_range_uses_head_and_lookback() {
        let reader = Arc::new(ScriptedReader {
            head: 50_000,
            logs: vec![],
            seen_range: Mutex::new(None),
        });
        let scanner = TransferScanner::new(Arc::clone(&reader) as Arc<dyn ChainReader>, 10_000);

        let facts = scanner
            .scan_transfers_to(8453, TOKEN, RECIPIENT, None, None)
            .await
            .unwrap();
        assert!(facts.is_empty());
        assert_eq!(*reader.seen_range.lock().unwrap(), Some((40_000, 50_000)));
    }

    #[tokio::test]
    async fn test_explicit_bounds_override_default() {
        let reader = Arc::new(ScriptedReader {
            head: 50_000,
            logs: vec![],
            seen_range: Mutex::new(None),
        });
        let scanner = TransferScanner::new(Arc::clone(&reader) as Arc<dyn ChainReader>, 10_000);

        scanner
            .scan_transfers_to(8453, TOKEN, RECIPIENT, Some(100), Some(200))
            .await
            .unwrap();
        assert_eq!(*reader.seen_range.lock().unwrap(), Some((100, 200)));
    }

    #[tokio::test]
    async fn test_lookback_saturates_near_genesis() {
        let reader = Arc::new(ScriptedReader {
            head: 500,
            logs: vec![],
            seen_range: Mutex::new(None),
        });
        let scanner = TransferScanner::new(Arc::clone(&reader) as Arc<dyn ChainReader>, 10_000);

        scanner
            .scan_transfers_to(8453, TOKEN, RECIPIENT, None, None)
            .await
            .unwrap();
        assert_eq!(*reader.seen_range.lock().unwrap(), Some((0, 500)));
    }

    #[tokio::test]
    async fn test_decodes_matching_transfers() {
        let reader = Arc::new(ScriptedReader {
            head: 50_000,
            logs: vec![
                raw_transfer(1, 49_990, RECIPIENT, 5_000_000),
                raw_transfer(2, 49_995, RECIPIENT, 7_300_000),
            ],
            seen_range: Mutex::new(None),
        });
        let scanner = TransferScanner::new(reader as Arc<dyn ChainReader>, 10_000);

        let facts = scanner
            .scan_transfers_to(8453, TOKEN, RECIPIENT, None, None)
            .await
            .unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].amount, U256::from(5_000_000u64));
        assert_eq!(facts[1].amount, U256::from(7_300_000u64));
        assert!(facts.iter().all(|f| f.block_timestamp == 0));
    }
}
