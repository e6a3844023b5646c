//! Known stablecoin deployments on EVM networks.
//!
//! Chains configured without an explicit token contract fall back to the
//! canonical USDC deployment for that network.

use alloy_primitives::{Address, address};
use paylink::chain::ChainId;
use serde::{Deserialize, Serialize};

/// Base Mainnet chain ID.
pub const BASE_MAINNET: ChainId = 8453;

/// Base Sepolia (testnet) chain ID.
pub const BASE_SEPOLIA: ChainId = 84532;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: ChainId = 137;

/// Polygon Amoy (testnet) chain ID.
pub const POLYGON_AMOY: ChainId = 80002;

/// Avalanche C-Chain chain ID.
pub const AVALANCHE_MAINNET: ChainId = 43114;

/// Avalanche Fuji (testnet) chain ID.
pub const AVALANCHE_FUJI: ChainId = 43113;

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: ChainId = 1;

/// Celo Mainnet chain ID.
pub const CELO_MAINNET: ChainId = 42220;

/// USDC contract address on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Base Sepolia.
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// USDC contract address on Ethereum Mainnet.
pub const USDC_ETHEREUM: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// USDC contract address on Polygon Mainnet.
pub const USDC_POLYGON: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// USDC contract address on Polygon Amoy.
pub const USDC_POLYGON_AMOY: Address = address!("41E94Eb71Ef8C9fAE0235d1e472b21E21B5a4dbF");

/// USDC contract address on Avalanche C-Chain.
pub const USDC_AVALANCHE: Address = address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E");

/// USDC contract address on Avalanche Fuji.
pub const USDC_AVALANCHE_FUJI: Address = address!("5425890298aed601595a70AB815c96711a31Bc65");

/// USDC contract address on Celo.
pub const USDC_CELO: Address = address!("cebA9300f2b948710d2653dD7B07f33A8B32118C");

/// USDC token decimals, identical on every deployment above.
pub const USDC_DECIMALS: u8 = 6;

/// A token deployment on an EVM network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDeployment {
    /// Contract address.
    pub address: Address,
    /// Number of decimals (e.g., 6 for USDC).
    pub decimals: u8,
}

/// Returns the canonical USDC deployment for a chain, if known.
#[must_use]
pub const fn known_token(chain: ChainId) -> Option<TokenDeployment> {
    let address = match chain {
        BASE_MAINNET => USDC_BASE,
        BASE_SEPOLIA => USDC_BASE_SEPOLIA,
        ETHEREUM_MAINNET => USDC_ETHEREUM,
        POLYGON_MAINNET => USDC_POLYGON,
        POLYGON_AMOY => USDC_POLYGON_AMOY,
        AVALANCHE_MAINNET => USDC_AVALANCHE,
        AVALANCHE_FUJI => USDC_AVALANCHE_FUJI,
        CELO_MAINNET => USDC_CELO,
        _ => return None,
    };
    Some(TokenDeployment {
        address,
        decimals: USDC_DECIMALS,
    })
}
