//! Scripted chain-reader doubles shared by the engine's unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_primitives::{Address, Log, TxHash, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;

use paylink::chain::{ChainAccessError, ChainId, ChainReader, RawTransferLog, ReceiptFacts};
use paylink_evm::IERC20;

/// A chain reader that replays scripted answers and counts calls.
pub(crate) struct ScriptedReader {
    receipt: Mutex<Option<ReceiptFacts>>,
    receipt_unavailable: bool,
    timestamp: Result<u64, ()>,
    head: u64,
    logs: Vec<RawTransferLog>,
    pub(crate) receipt_calls: AtomicUsize,
}

impl ScriptedReader {
    pub(crate) fn new() -> Self {
        Self {
            receipt: Mutex::new(None),
            receipt_unavailable: false,
            timestamp: Ok(1_700_000_000),
            head: 50_000,
            logs: Vec::new(),
            receipt_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_receipt(self, receipt: ReceiptFacts) -> Self {
        *self.receipt.lock().unwrap() = Some(receipt);
        self
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.receipt_unavailable = true;
        self
    }

    pub(crate) fn with_timestamp_outage(mut self) -> Self {
        self.timestamp = Err(());
        self
    }

    pub(crate) fn with_logs(mut self, logs: Vec<RawTransferLog>) -> Self {
        self.logs = logs;
        self
    }
}

#[async_trait]
impl ChainReader for ScriptedReader {
    async fn receipt(
        &self,
        chain: ChainId,
        _tx_hash: TxHash,
    ) -> Result<Option<ReceiptFacts>, ChainAccessError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        if self.receipt_unavailable {
            return Err(ChainAccessError::Unavailable {
                chain,
                reason: "scripted outage".into(),
            });
        }
        Ok(self.receipt.lock().unwrap().clone())
    }

    async fn block_timestamp(
        &self,
        chain: ChainId,
        _number: u64,
    ) -> Result<u64, ChainAccessError> {
        self.timestamp.map_err(|()| ChainAccessError::Unavailable {
            chain,
            reason: "scripted outage".into(),
        })
    }

    async fn head_block(&self, _chain: ChainId) -> Result<u64, ChainAccessError> {
        Ok(self.head)
    }

    async fn transfer_logs(
        &self,
        _chain: ChainId,
        _token: Address,
        _to: Address,
        _from_block: u64,
        _to_block: u64,
    ) -> Result<Vec<RawTransferLog>, ChainAccessError> {
        Ok(self.logs.clone())
    }
}

/// Encodes an ERC-20 `Transfer` log emitted by `token`.
pub(crate) fn transfer_log(token: Address, from: Address, to: Address, value: u64) -> Log {
    Log {
        address: token,
        data: IERC20::Transfer {
            from,
            to,
            value: U256::from(value),
        }
        .encode_log_data(),
    }
}

/// A successful receipt carrying the given logs.
pub(crate) fn receipt_with(status: bool, block_number: u64, logs: Vec<Log>) -> ReceiptFacts {
    ReceiptFacts {
        status,
        block_number,
        logs,
    }
}
