//! Content access decisions.
//!
//! Access to paid content hinges on a recorded payment that still verifies
//! on-chain. The [`FreshnessWindow`] names the trust-recent-writes policy: a
//! payment row created moments ago was written immediately after a
//! client-observed successful transaction, so re-verifying it on every
//! content view buys nothing but RPC load. The window trades a small,
//! bounded spoofability window for that saving; rows older than the window
//! always go through full on-chain verification.

use std::time::Duration;

use serde::Serialize;

use paylink::ledger::Payment;

/// Named trust-recent-writes policy for access checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow(Duration);

/// Default trailing window during which a recorded payment is trusted
/// without re-verification.
pub const DEFAULT_FRESHNESS_WINDOW: FreshnessWindow =
    FreshnessWindow(Duration::from_secs(300));

impl FreshnessWindow {
    /// Creates a window of the given duration.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self(window)
    }

    /// Whether a payment row is recent enough to trust without RPC.
    #[must_use]
    pub fn covers(&self, payment: &Payment) -> bool {
        payment.recorded_at.age_secs() <= self.0.as_secs()
    }
}

/// The answer to "does this wallet have access to this content".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    /// Whether access is granted.
    pub has_access: bool,
    /// Human-readable explanation when access is denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AccessDecision {
    /// Grants access.
    #[must_use]
    pub const fn granted() -> Self {
        Self {
            has_access: true,
            reason: None,
        }
    }

    /// Denies access with a user-facing reason.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            has_access: false,
            reason: Some(reason.into()),
        }
    }
}
