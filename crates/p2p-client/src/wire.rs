//! Wire types for the `adv/search` endpoint.

use model::{Filter, Order};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of one search request.
///
/// The provider expects an empty string for an unset amount and an empty
/// list for unset payment methods, not `null`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdvSearchRequest<'a> {
    pub asset: &'a str,
    pub fiat: &'a str,
    pub page: u32,
    pub rows: u32,
    pub trade_type: &'a str,
    pub trans_amount: String,
    pub pay_types: Vec<&'a str>,
    pub publisher_type: Option<&'a str>,
}

impl<'a> AdvSearchRequest<'a> {
    pub(crate) fn from_filter(filter: &'a Filter) -> Self {
        Self {
            asset: &filter.asset,
            fiat: &filter.fiat,
            page: 1,
            rows: filter.rows,
            trade_type: filter.side.as_provider_str(),
            trans_amount: filter
                .trans_amount
                .map(|a| a.to_string())
                .unwrap_or_default(),
            pay_types: filter.pay_method.as_deref().into_iter().collect(),
            publisher_type: None,
        }
    }
}

/// Envelope of one search response. A missing `data` field is an empty
/// result, not an error.
#[derive(Debug, Deserialize)]
pub(crate) struct AdvSearchResponse {
    #[serde(default)]
    pub data: Vec<AdvRow>,
}

/// One ranked advert row.
#[derive(Debug, Deserialize)]
pub(crate) struct AdvRow {
    pub adv: Adv,
    pub advertiser: Advertiser,
}

impl AdvRow {
    pub(crate) fn into_order(self) -> Order {
        Order {
            advertiser: self.advertiser.nick_name,
            price: self.adv.price,
            pay_methods: self
                .adv
                .trade_methods
                .into_iter()
                .filter_map(|m| m.identifier)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Adv {
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub price: Decimal,
    #[serde(default)]
    pub trade_methods: Vec<TradeMethod>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TradeMethod {
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Advertiser {
    pub nick_name: String,
}

/// Deserialize a Decimal from a string field.
fn deserialize_decimal_from_str<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    s.parse::<Decimal>().map_err(serde::de::Error::custom)
}
