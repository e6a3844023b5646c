//! Error types for the engine service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::verifier::VerifierError;
use paylink::amount::MalformedAmount;
use paylink::ledger::LedgerError;
use paylink::verdict::InvalidReason;

/// Errors that can occur in engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested item does not exist.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The transaction definitively does not prove the payment. The reason
    /// is safe to show to the payer.
    #[error("payment verification failed: {0}")]
    VerificationFailed(InvalidReason),

    /// A fixed item carries a stored price the codec rejects.
    #[error("invalid stored price for item {item_id}: {source}")]
    BadItemPrice {
        /// The item with the bad price.
        item_id: String,
        /// Why the price failed to convert.
        source: MalformedAmount,
    },

    /// Verification could not run (unsupported chain or provider outage).
    #[error(transparent)]
    Verifier(#[from] VerifierError),

    /// The ledger collaborator failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UnknownItem(_) => StatusCode::NOT_FOUND,
            Self::VerificationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) | Self::Verifier(VerifierError::UnsupportedChain(_)) => {
                StatusCode::BAD_REQUEST
            }
            // Retryable: the chain could not be consulted, nothing is known.
            Self::Verifier(VerifierError::ChainUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadItemPrice { .. } | Self::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
