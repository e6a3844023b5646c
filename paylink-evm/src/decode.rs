//! ERC-20 `Transfer` event decoding.
//!
//! A transaction may carry logs from any number of contracts; only the logs
//! emitted by the configured token contract and matching the canonical
//! `Transfer(address,address,uint256)` shape count as payments. Logs that
//! fail to decode are not errors - they are simply not transfers - so
//! decoding is an attempt returning `Option`, and unrelated events on the
//! same transaction can never abort an otherwise-valid verification.

use alloy_primitives::{Address, Log, TxHash};
use alloy_sol_types::{SolEvent, sol};
use paylink::transfer::TransferFact;

sol! {
    /// Minimal ERC-20 surface: only the `Transfer` event is consumed.
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

/// Attempts to decode a raw log as an ERC-20 `Transfer` event.
///
/// Returns `None` for logs with the wrong topic count or shape; the two
/// outcomes (decoded vs. not-a-transfer) are a typed branch, never an error.
#[must_use]
pub fn decode_transfer(log: &Log) -> Option<IERC20::Transfer> {
    IERC20::Transfer::decode_log(log).ok().map(|decoded| decoded.data)
}

/// Extracts all `Transfer` facts emitted by `token` in one transaction.
///
/// Filters by emitting address first (addresses are canonical 20-byte
/// values, so equality is already case-insensitive), then attempt-decodes
/// each survivor. Zero facts is a valid outcome, distinct from a fetch
/// failure. Block timestamps are left at 0 for the caller to resolve.
#[must_use]
pub fn decode_transfers(
    tx_hash: TxHash,
    block_number: u64,
    logs: &[Log],
    token: Address,
) -> Vec<TransferFact> {
    logs.iter()
        .filter(|log| log.address == token)
        .filter_map(decode_transfer)
        .map(|transfer| TransferFact {
            tx_hash,
            from: transfer.from,
            to: transfer.to,
            amount: transfer.value,
            block_number,
            block_timestamp: 0,
        })
        .collect()
}
