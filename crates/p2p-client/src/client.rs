//! P2P search client.

use crate::error::P2pError;
use crate::wire::{AdvRow, AdvSearchRequest, AdvSearchResponse};
use async_trait::async_trait;
use model::{Filter, Order};
use monitor_core::{OrderSource, QueryError};
use rest_client::RestClient;
use std::time::Duration;

/// Public host of the P2P order book.
pub const P2P_BASE_URL: &str = "https://p2p.binance.com";

/// Search endpoint path.
const SEARCH_PATH: &str = "/bapi/c2c/v2/friendly/c2c/adv/search";

/// Request timeout for search calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the P2P advert search endpoint.
pub struct P2pClient {
    client: RestClient,
}

impl P2pClient {
    /// Create a client against the public host.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, P2pError> {
        Self::with_base_url(P2P_BASE_URL)
    }

    /// Create a client against a specific base URL (tests).
    pub fn with_base_url(base_url: &str) -> Result<Self, P2pError> {
        let client = RestClient::new(base_url, REQUEST_TIMEOUT)?;
        Ok(Self { client })
    }

    /// Run one advert search. Rows come back in provider rank order,
    /// best price first.
    pub async fn search_adverts(&self, filter: &Filter) -> Result<Vec<Order>, P2pError> {
        let request = AdvSearchRequest::from_filter(filter);

        tracing::debug!(
            asset = %filter.asset,
            fiat = %filter.fiat,
            side = %filter.side,
            rows = filter.rows,
            "searching P2P adverts"
        );

        let response: AdvSearchResponse = self.client.post_json(SEARCH_PATH, &request).await?;

        Ok(response.data.into_iter().map(AdvRow::into_order).collect())
    }
}

#[async_trait]
impl OrderSource for P2pClient {
    async fn search(&self, filter: &Filter) -> Result<Vec<Order>, QueryError> {
        self.search_adverts(filter).await.map_err(QueryError::from)
    }
}

impl std::fmt::Debug for P2pClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P2pClient")
            .field("base_url", &self.client.base_url())
            .finish()
    }
}
