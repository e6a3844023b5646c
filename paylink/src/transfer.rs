//! Chain-confirmed transfer facts.

use crate::amount::serde_u256_dec;
use alloy_primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

/// The decoded, chain-confirmed truth of one token movement.
///
/// Produced only by the transfer decoder from a fetched receipt or log scan,
/// never constructed from client input. A single transaction can emit several
/// `Transfer` events (batched transfers, fee splits); one fact exists per
/// event, and consumers filter to the subset addressed to the recipient they
/// care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFact {
    /// Hash of the emitting transaction.
    pub tx_hash: TxHash,
    /// Sender of the tokens.
    pub from: Address,
    /// Recipient of the tokens.
    pub to: Address,
    /// Amount in the token's smallest unit.
    #[serde(with = "serde_u256_dec")]
    pub amount: U256,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Block timestamp in unix seconds; 0 when not (yet) resolved.
    pub block_timestamp: u64,
}

impl TransferFact {
    /// Returns a copy with the block timestamp filled in.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.block_timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    #[test]
    fn test_amount_serializes_as_decimal_string() {
        let fact = TransferFact {
            tx_hash: b256!("a9d1e08c7793af67e9d92fe308d5697fb81d3e43ce35d8ba6dd0ebc4e3b7f3e2"),
            from: address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            to: address!("Ab5801a7D398351b8bE11C439e05C5B3259aeC9B"),
            amount: U256::from(5_000_000u64),
            block_number: 19_000_000,
            block_timestamp: 1_700_000_000,
        };
        let json = serde_json::to_value(fact).unwrap();
        assert_eq!(json["amount"], "5000000");
        let back: TransferFact = serde_json::from_value(json).unwrap();
        assert_eq!(back, fact);
    }
}
