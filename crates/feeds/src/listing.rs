//! Public pool listing feed.
//!
//! Fetched once at startup. Each record names a pool ("X/Y") and gives its swap
//! account and liquidity mint; everything else is read from chain.

use crate::{FeedError, FeedResult};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// One pool as advertised by the listing feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolListing {
    /// Pool symbol pair, e.g. "SOL/USDC".
    pub name: String,
    /// Pools flagged deprecated upstream are never traded.
    #[serde(default)]
    pub deprecated: bool,
    /// Swap state account (base58).
    pub swap_account: String,
    /// Liquidity mint (base58).
    pub pool_mint: String,
}

fn parse_key(value: &str, field: &str) -> FeedResult<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| FeedError::ParseError(format!("invalid {} '{}': {}", field, value, e)))
}

impl PoolListing {
    pub fn swap_account_key(&self) -> FeedResult<Pubkey> {
        parse_key(&self.swap_account, "swap account")
    }

    pub fn pool_mint_key(&self) -> FeedResult<Pubkey> {
        parse_key(&self.pool_mint, "pool mint")
    }
}

/// Parse a listing payload (a JSON array of records).
pub fn parse_listings(json: &str) -> FeedResult<Vec<PoolListing>> {
    Ok(serde_json::from_str(json)?)
}

/// HTTP client for the pool listing feed.
pub struct PoolListingClient {
    client: reqwest::Client,
    url: String,
}

impl PoolListingClient {
    /// Create a client for the given feed URL.
    pub fn new(url: impl Into<String>) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Fetch all pool records.
    pub async fn fetch(&self) -> FeedResult<Vec<PoolListing>> {
        debug!("Fetching pool listing from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Http(format!("HTTP {}", response.status())));
        }

        let body = response.text().await?;
        let listings = parse_listings(&body)?;
        info!("Pool listing: {} records", listings.len());
        Ok(listings)
    }
}
