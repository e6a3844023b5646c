//! Per-chain JSON-RPC provider cache.
//!
//! [`ChainAccess`] owns one long-lived read provider per configured chain,
//! created idempotently on first use and never torn down during the process
//! lifetime (a simple cache-by-key, not an evicting pool: the chain set is
//! small and fixed). Every RPC call carries a timeout; timeouts and
//! transport failures surface as [`ChainAccessError::Unavailable`], which
//! callers must treat as "unknown - retry", never as invalidity.

use std::collections::HashMap;
use std::future::IntoFuture;
use std::num::NonZeroUsize;
use std::time::Duration;

use alloy_primitives::{Address, TxHash};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{BlockNumberOrTag, Filter};
use alloy_transport::TransportError;
use alloy_transport::layers::{FallbackLayer, ThrottleLayer};
use alloy_transport_http::Http;
use async_trait::async_trait;
use dashmap::DashMap;
use tower::ServiceBuilder;
use url::Url;

use crate::decode::IERC20;
use alloy_sol_types::SolEvent;
use paylink::chain::{ChainAccessError, ChainId, ChainReader, RawTransferLog, ReceiptFacts};

/// Default per-call timeout applied to every provider round-trip.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// An HTTP RPC endpoint with an optional requests-per-second limit.
#[derive(Debug, Clone)]
pub struct ChainEndpoint {
    /// Endpoint URL (http or https).
    pub url: Url,
    /// Optional client-side rate limit, requests per second.
    pub rate_limit: Option<u32>,
}

/// Cached read access to a fixed set of EVM chains.
#[derive(Debug)]
pub struct ChainAccess {
    endpoints: HashMap<ChainId, Vec<ChainEndpoint>>,
    providers: DashMap<ChainId, RootProvider>,
    call_timeout: Duration,
}

impl ChainAccess {
    /// Creates chain access over the given endpoint map.
    #[must_use]
    pub fn new(endpoints: HashMap<ChainId, Vec<ChainEndpoint>>, call_timeout: Duration) -> Self {
        Self {
            endpoints,
            providers: DashMap::new(),
            call_timeout,
        }
    }

    /// Builds an RPC client over HTTP transports with optional per-endpoint
    /// rate limits and transport-level fallback. Non-HTTP(S) URLs are
    /// silently skipped.
    ///
    /// # Panics
    ///
    /// Panics if no valid HTTP transports remain after filtering; endpoint
    /// lists are validated at configuration load.
    #[must_use]
    pub fn rpc_client(chain: ChainId, endpoints: &[ChainEndpoint]) -> RpcClient {
        let transports = endpoints
            .iter()
            .filter_map(|endpoint| {
                let scheme = endpoint.url.scheme();
                if scheme != "http" && scheme != "https" {
                    return None;
                }
                tracing::info!(chain, rpc_url = %endpoint.url, rate_limit = ?endpoint.rate_limit, "Using HTTP transport");
                let limit = endpoint.rate_limit.unwrap_or(u32::MAX);
                let service = ServiceBuilder::new()
                    .layer(ThrottleLayer::new(limit))
                    .service(Http::new(endpoint.url.clone()));
                Some(service)
            })
            .collect::<Vec<_>>();
        let fallback = ServiceBuilder::new()
            .layer(
                FallbackLayer::default().with_active_transport_count(
                    NonZeroUsize::new(transports.len())
                        .expect("at least one HTTP endpoint per chain"),
                ),
            )
            .service(transports);
        RpcClient::new(fallback, false)
    }

    /// Returns the provider for a chain, creating it on first use.
    ///
    /// Creation is idempotent under concurrent callers: all racers build
    /// against the same endpoint list, and the cache keeps whichever landed
    /// first, so at most one provider per chain survives.
    fn provider(&self, chain: ChainId) -> Result<RootProvider, ChainAccessError> {
        if let Some(existing) = self.providers.get(&chain) {
            return Ok(existing.clone());
        }
        let endpoints = self
            .endpoints
            .get(&chain)
            .ok_or(ChainAccessError::UnknownChain(chain))?;
        let client = Self::rpc_client(chain, endpoints);
        let provider = RootProvider::new(client);
        Ok(self
            .providers
            .entry(chain)
            .or_insert(provider)
            .value()
            .clone())
    }

    /// Awaits a provider call under the configured timeout, mapping both
    /// elapsed timers and transport errors to `Unavailable`.
    async fn guarded<T, F>(&self, chain: ChainId, call: F) -> Result<T, ChainAccessError>
    where
        F: IntoFuture<Output = Result<T, TransportError>> + Send,
        F::IntoFuture: Send,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ChainAccessError::Unavailable {
                chain,
                reason: err.to_string(),
            }),
            Err(_) => Err(ChainAccessError::Unavailable {
                chain,
                reason: format!("call timed out after {:?}", self.call_timeout),
            }),
        }
    }
}

#[async_trait]
impl ChainReader for ChainAccess {
    async fn receipt(
        &self,
        chain: ChainId,
        tx_hash: TxHash,
    ) -> Result<Option<ReceiptFacts>, ChainAccessError> {
        let provider = self.provider(chain)?;
        let receipt = self
            .guarded(chain, provider.get_transaction_receipt(tx_hash))
            .await?;
        Ok(receipt.map(|receipt| ReceiptFacts {
            status: receipt.status(),
            block_number: receipt.block_number.unwrap_or_default(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }))
    }

    async fn block_timestamp(
        &self,
        chain: ChainId,
        number: u64,
    ) -> Result<u64, ChainAccessError> {
        let provider = self.provider(chain)?;
        let block = self
            .guarded(
                chain,
                provider.get_block_by_number(BlockNumberOrTag::Number(number)),
            )
            .await?;
        block
            .map(|block| block.header.timestamp)
            .ok_or_else(|| ChainAccessError::Unavailable {
                chain,
                reason: format!("block {number} not found"),
            })
    }

    async fn head_block(&self, chain: ChainId) -> Result<u64, ChainAccessError> {
        let provider = self.provider(chain)?;
        self.guarded(chain, provider.get_block_number()).await
    }

    async fn transfer_logs(
        &self,
        chain: ChainId,
        token: Address,
        to: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawTransferLog>, ChainAccessError> {
        let provider = self.provider(chain)?;
        let filter = Filter::new()
            .address(token)
            .event_signature(IERC20::Transfer::SIGNATURE_HASH)
            .topic2(to.into_word())
            .from_block(from_block)
            .to_block(to_block);
        let logs = self.guarded(chain, provider.get_logs(&filter)).await?;
        Ok(logs
            .into_iter()
            .map(|log| RawTransferLog {
                tx_hash: log.transaction_hash.unwrap_or_default(),
                block_number: log.block_number.unwrap_or_default(),
                log: log.inner,
            })
            .collect())
    }
}
