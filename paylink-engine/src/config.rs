//! Engine service configuration.
//!
//! Loads configuration from a TOML file with support for environment
//! variable expansion in string values. Variables use `$VAR` or `${VAR}`
//! syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4030
//! cache_ttl_secs = 600
//! freshness_window_secs = 300
//!
//! [chains.8453]
//! rpc_url = "$RPC_URL_BASE"
//! token_address = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
//! token_decimals = 6
//! ```
//!
//! Chains without an explicit token contract fall back to the canonical
//! USDC deployment for that network, when known.
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` / `PORT` - Override server bind address and port
//! - RPC URLs and other secrets referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::warn;

use paylink::chain::ChainId;
use paylink_evm::networks::known_token;
use paylink_evm::provider::ChainEndpoint;
use paylink_evm::{DEFAULT_LOOKBACK_BLOCKS, TokenDeployment};

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `4030`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Verification cache TTL in seconds (default: 600).
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Verification cache sweep interval in seconds (default: 60).
    #[serde(default = "default_cache_sweep_secs")]
    pub cache_sweep_secs: u64,

    /// Trust-recent-writes window for access checks, seconds (default: 300).
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,

    /// Look-back window for unbounded reconciliation scans, blocks
    /// (default: 10000).
    #[serde(default = "default_scan_lookback_blocks")]
    pub scan_lookback_blocks: u64,

    /// Per-call RPC timeout in seconds (default: 10).
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Chain configurations keyed by EIP-155 chain ID.
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

/// Per-chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// HTTP RPC endpoint URL. Supports `$VAR` / `${VAR}` expansion.
    pub rpc_url: String,

    /// Optional client-side rate limit, requests per second.
    #[serde(default)]
    pub rate_limit: Option<u32>,

    /// Token contract verified against on this chain; defaults to the
    /// canonical USDC deployment when omitted.
    #[serde(default)]
    pub token_address: Option<Address>,

    /// Token decimals; defaults alongside `token_address`.
    #[serde(default)]
    pub token_decimals: Option<u8>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    4030
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_cache_sweep_secs() -> u64 {
    60
}

fn default_freshness_window_secs() -> u64 {
    300
}

fn default_scan_lookback_blocks() -> u64 {
    DEFAULT_LOOKBACK_BLOCKS
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

impl EngineConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path. A missing file yields
    /// pure defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string, expanding `$VAR` references
    /// and applying `HOST` / `PORT` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML cannot be parsed.
    pub fn parse(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let expanded = expand_env_vars(content);
        let mut config: Self = toml::from_str(&expanded)?;

        if let Ok(host) = std::env::var("HOST")
            && let Ok(addr) = host.parse()
        {
            config.host = addr;
        }
        if let Ok(port) = std::env::var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        Ok(config)
    }

    /// RPC endpoints per chain, skipping entries that fail to parse.
    #[must_use]
    pub fn endpoints(&self) -> HashMap<ChainId, Vec<ChainEndpoint>> {
        self.valid_chains()
            .map(|(chain, cfg, url)| {
                (
                    chain,
                    vec![ChainEndpoint {
                        url,
                        rate_limit: cfg.rate_limit,
                    }],
                )
            })
            .collect()
    }

    /// Token deployments per chain, falling back to known USDC deployments.
    #[must_use]
    pub fn tokens(&self) -> HashMap<ChainId, TokenDeployment> {
        self.valid_chains()
            .filter_map(|(chain, cfg, _)| {
                let deployment = match (cfg.token_address, cfg.token_decimals) {
                    (Some(address), decimals) => Some(TokenDeployment {
                        address,
                        decimals: decimals.unwrap_or(paylink_evm::networks::USDC_DECIMALS),
                    }),
                    (None, _) => known_token(chain),
                };
                if deployment.is_none() {
                    warn!(chain, "Skipping chain: no token configured and none known");
                }
                deployment.map(|d| (chain, d))
            })
            .collect()
    }

    /// Chains with a parseable chain ID and RPC URL.
    fn valid_chains(&self) -> impl Iterator<Item = (ChainId, &ChainConfig, url::Url)> {
        self.chains.iter().filter_map(|(key, cfg)| {
            let Ok(chain) = key.parse::<ChainId>() else {
                warn!(key, "Skipping chain: key is not a numeric EIP-155 chain ID");
                return None;
            };
            let Ok(url) = cfg.rpc_url.parse::<url::Url>() else {
                warn!(chain, rpc_url = %cfg.rpc_url, "Skipping chain: invalid RPC URL");
                return None;
            };
            if url.scheme() != "http" && url.scheme() != "https" {
                warn!(chain, rpc_url = %cfg.rpc_url, "Skipping chain: RPC URL must be http(s)");
                return None;
            }
            Some((chain, cfg, url))
        })
    }

    /// Verification cache TTL.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Verification cache sweep interval.
    #[must_use]
    pub const fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_secs)
    }

    /// Trust-recent-writes window.
    #[must_use]
    pub const fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    /// Per-call RPC timeout.
    #[must_use]
    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment
/// variables. Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next(); // consume '{'
            }

            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if braced {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                } else if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                var_name.push(c);
                chars.next();
            }

            if var_name.is_empty() {
                result.push('$');
                if braced {
                    result.push('{');
                }
            } else if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}
