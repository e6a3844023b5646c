//! Axum route handlers for the engine service.
//!
//! The HTTP surface mirrors the engine's library API: verify a claimed
//! payment, record one, reconcile a block range, and check content access.
//! Amounts cross the wire as base-10 smallest-unit strings, never JSON
//! numbers.

use std::sync::Arc;

use alloy_primitives::{Address, TxHash, U256};
use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::access::AccessDecision;
use crate::engine::{PaymentEngine, RecordOutcome};
use crate::error::EngineError;
use crate::reconcile::{ReconciliationReport, ReconciliationSummary};
use paylink::chain::ChainId;
use paylink::transfer::TransferFact;
use paylink::verdict::VerificationResult;

/// Shared application state for the engine service.
pub type EngineState = Arc<PaymentEngine>;

/// Body of `POST /verify`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// EIP-155 chain ID.
    pub chain: ChainId,
    /// Transaction hash to verify.
    pub tx_hash: TxHash,
    /// Expected recipient wallet.
    pub recipient: Address,
    /// Expected amount in smallest units (base-10 string); omit for
    /// open-amount payments.
    #[serde(default)]
    pub amount: Option<String>,
}

/// Response of `POST /verify`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Whether a matching transfer was confirmed.
    pub valid: bool,
    /// The queried transaction hash.
    pub tx_hash: TxHash,
    /// The confirmed transfer, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferFact>,
    /// Human-readable failure reason, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerifyResponse {
    fn from_result(tx_hash: TxHash, result: VerificationResult) -> Self {
        match result {
            VerificationResult::Valid(fact) => Self {
                valid: true,
                tx_hash,
                transfer: Some(fact),
                reason: None,
            },
            VerificationResult::Invalid(reason) => Self {
                valid: false,
                tx_hash,
                transfer: None,
                reason: Some(reason.to_string()),
            },
        }
    }
}

/// Body of `POST /payments`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    /// The item the payment is for.
    pub item_id: String,
    /// The transaction claimed to pay it.
    pub tx_hash: TxHash,
}

/// Body of `POST /reconcile`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    /// EIP-155 chain ID.
    pub chain: ChainId,
    /// Recipient wallet to sweep for.
    pub recipient: Address,
    /// Scan start block; defaults to a trailing window below the head.
    #[serde(default)]
    pub from_block: Option<u64>,
    /// Scan end block; defaults to the chain head.
    #[serde(default)]
    pub to_block: Option<u64>,
}

/// Response of `POST /reconcile`: per-bucket counts plus the full lists.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    /// Per-bucket counts.
    pub summary: ReconciliationSummary,
    /// The full report lists.
    #[serde(flatten)]
    pub report: ReconciliationReport,
}

/// `POST /verify` - verifies a claimed payment against chain state.
///
/// # Errors
///
/// 400 on malformed input, 503 when the chain cannot be consulted.
/// Definitive negative verdicts are 200 with `valid: false`.
pub async fn post_verify(
    State(engine): State<EngineState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, EngineError> {
    let amount = body
        .amount
        .map(|s| {
            U256::from_str_radix(&s, 10).map_err(|_| {
                EngineError::BadRequest(format!(
                    "amount must be a base-10 smallest-unit integer, got `{s}`"
                ))
            })
        })
        .transpose()?;
    let result = engine
        .verify_payment(body.chain, body.tx_hash, body.recipient, amount)
        .await?;
    Ok(Json(VerifyResponse::from_result(body.tx_hash, result)))
}

/// `POST /payments` - verifies and records a client-submitted payment.
///
/// # Errors
///
/// 404 for unknown items, 422 when verification fails, 503 on chain
/// outages. Duplicate submissions succeed with `alreadyRecorded: true`.
pub async fn post_record(
    State(engine): State<EngineState>,
    Json(body): Json<RecordRequest>,
) -> Result<Json<RecordOutcome>, EngineError> {
    let outcome = engine.record_payment(&body.item_id, body.tx_hash).await?;
    Ok(Json(outcome))
}

/// `POST /reconcile` - scans a block range and reconciles the transfers.
///
/// # Errors
///
/// 400 for unsupported chains, 503 when the scan cannot run.
pub async fn post_reconcile(
    State(engine): State<EngineState>,
    Json(body): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, EngineError> {
    let report = engine
        .scan_and_reconcile(body.chain, body.recipient, body.from_block, body.to_block)
        .await?;
    Ok(Json(ReconcileResponse {
        summary: report.summary(),
        report,
    }))
}

/// `GET /access/{item_id}/{payer}` - does this wallet have access to this
/// content.
///
/// # Errors
///
/// 404 for unknown items, 503 when re-verification cannot reach the chain
/// (retryable, deliberately not a denial).
pub async fn get_access(
    State(engine): State<EngineState>,
    Path((item_id, payer)): Path<(String, Address)>,
) -> Result<Json<AccessDecision>, EngineError> {
    let decision = engine.check_access(payer, &item_id).await?;
    Ok(Json(decision))
}

/// Creates an [`axum::Router`] with all engine endpoints.
///
/// - `POST /verify` - verify a claimed payment
/// - `POST /payments` - verify and record a payment
/// - `POST /reconcile` - scan and reconcile a block range
/// - `GET /access/{item_id}/{payer}` - check content access
pub fn engine_router(state: EngineState) -> axum::Router {
    axum::Router::new()
        .route("/verify", axum::routing::post(post_verify))
        .route("/payments", axum::routing::post(post_record))
        .route("/reconcile", axum::routing::post(post_reconcile))
        .route("/access/{item_id}/{payer}", axum::routing::get(get_access))
        .with_state(state)
}
