//! Integration tests driving [`ChainAccess`] against a mock JSON-RPC server.
//!
//! Covers the classification contract: definitive chain answers (receipt
//! null, logs found) come back as values, while transport failures and
//! timeouts surface as `Unavailable` and are never mistaken for invalidity.

use std::collections::HashMap;
use std::time::Duration;

use alloy_primitives::{B256, U256, address};
use paylink::chain::{ChainAccessError, ChainReader};
use paylink_evm::{ChainAccess, ChainEndpoint};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const CHAIN: u64 = 8453;
const TOKEN: alloy_primitives::Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
const SENDER: alloy_primitives::Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
const RECIPIENT: alloy_primitives::Address = address!("Ab5801a7D398351b8bE11C439e05C5B3259aeC9B");

/// Responds with a fixed JSON-RPC `result`, echoing the request's `id`.
struct RpcResult(serde_json::Value);

impl Respond for RpcResult {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value =
            serde_json::from_slice(&request.body).unwrap_or(serde_json::Value::Null);
        let id = body.get("id").cloned().unwrap_or(serde_json::json!(1));
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": self.0,
        }))
    }
}

fn chain_access(server: &MockServer, timeout: Duration) -> ChainAccess {
    let mut endpoints = HashMap::new();
    endpoints.insert(
        CHAIN,
        vec![ChainEndpoint {
            url: server.uri().parse().expect("mock server uri"),
            rate_limit: None,
        }],
    );
    ChainAccess::new(endpoints, timeout)
}

#[tokio::test]
async fn receipt_null_is_definitive_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(
            serde_json::json!({"method": "eth_getTransactionReceipt"}),
        ))
        .respond_with(RpcResult(serde_json::Value::Null))
        .mount(&server)
        .await;

    let access = chain_access(&server, Duration::from_secs(5));
    let receipt = access.receipt(CHAIN, B256::repeat_byte(1)).await.unwrap();
    assert!(receipt.is_none());
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let access = chain_access(&server, Duration::from_secs(5));
    let err = access.receipt(CHAIN, B256::repeat_byte(1)).await.unwrap_err();
    assert!(matches!(err, ChainAccessError::Unavailable { chain, .. } if chain == CHAIN));
}

#[tokio::test]
async fn slow_endpoint_times_out_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(serde_json::json!({"jsonrpc": "2.0", "id": 0, "result": null})),
        )
        .mount(&server)
        .await;

    let access = chain_access(&server, Duration::from_millis(100));
    let err = access.receipt(CHAIN, B256::repeat_byte(1)).await.unwrap_err();
    assert!(matches!(err, ChainAccessError::Unavailable { .. }));
}

#[tokio::test]
async fn unknown_chain_is_not_unavailable() {
    let server = MockServer::start().await;
    let access = chain_access(&server, Duration::from_secs(5));
    let err = access.receipt(999, B256::repeat_byte(1)).await.unwrap_err();
    assert!(matches!(err, ChainAccessError::UnknownChain(999)));
}

#[tokio::test]
async fn transfer_logs_decode_through_scan() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(
            serde_json::json!({"method": "eth_blockNumber"}),
        ))
        .respond_with(RpcResult(serde_json::json!("0xc350")))
        .mount(&server)
        .await;

    let transfer_sig = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
    let log = serde_json::json!({
        "address": format!("{TOKEN:#x}"),
        "topics": [
            transfer_sig,
            format!("{:#x}", SENDER.into_word()),
            format!("{:#x}", RECIPIENT.into_word()),
        ],
        "data": format!("{:#x}", B256::from(U256::from(5_000_000u64))),
        "blockNumber": "0xc34f",
        "transactionHash": format!("{:#x}", B256::repeat_byte(7)),
        "transactionIndex": "0x0",
        "blockHash": format!("{:#x}", B256::repeat_byte(9)),
        "logIndex": "0x0",
        "removed": false
    });
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"method": "eth_getLogs"})))
        .respond_with(RpcResult(serde_json::json!([log])))
        .mount(&server)
        .await;

    let access = chain_access(&server, Duration::from_secs(5));

    let head = access.head_block(CHAIN).await.unwrap();
    assert_eq!(head, 50_000);

    let raw = access
        .transfer_logs(CHAIN, TOKEN, RECIPIENT, head - 100, head)
        .await
        .unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].tx_hash, B256::repeat_byte(7));
    assert_eq!(raw[0].block_number, 0xc34f);

    let transfer = paylink_evm::decode_transfer(&raw[0].log).expect("decodes as Transfer");
    assert_eq!(transfer.from, SENDER);
    assert_eq!(transfer.to, RECIPIENT);
    assert_eq!(transfer.value, U256::from(5_000_000u64));
}
