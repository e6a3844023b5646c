//! Payable items.
//!
//! A [`PaymentItem`] is an obligation a creator can be paid for: either a
//! fixed price decided up front, or an open amount decided by the payer.
//! Items are created and edited by the surrounding application; the engine
//! only reads them.

use crate::amount::{self, MalformedAmount};
use crate::chain::ChainId;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Whether an item's amount is predetermined or chosen by the payer.
///
/// The enum shape carries the invariant: a fixed item always has a price
/// string, an open item never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ItemKind {
    /// Predetermined price, stored as a decimal string (e.g., `"5.00"`).
    Fixed {
        /// Human-readable decimal price, positive.
        price: String,
    },
    /// Pay-what-you-want; the amount is decided at payment time.
    Open,
}

/// A payable obligation owned by a creator page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentItem {
    /// Opaque item identifier.
    pub id: String,
    /// Identifier of the owning page.
    pub page_id: String,
    /// Display title.
    pub title: String,
    /// Fixed or open amount.
    pub kind: ItemKind,
    /// Payout wallet of the owning page.
    pub recipient: Address,
    /// Chain the item is payable on.
    pub chain: ChainId,
    /// Reference to the gated content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_ref: Option<String>,
}

impl PaymentItem {
    /// Returns the stored price string for fixed items, `None` for open ones.
    #[must_use]
    pub fn price(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Fixed { price } => Some(price),
            ItemKind::Open => None,
        }
    }

    /// Resolves the expected smallest-unit amount for this item.
    ///
    /// Fixed items convert their stored price through the amount codec;
    /// open items have no expected amount.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedAmount`] if a fixed item carries an unparseable
    /// price string.
    pub fn expected_amount(&self, decimals: u8) -> Result<Option<U256>, MalformedAmount> {
        match &self.kind {
            ItemKind::Fixed { price } => amount::to_smallest_unit(price, decimals).map(Some),
            ItemKind::Open => Ok(None),
        }
    }
}
