use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier for one user conversation (the Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the order book the user is taking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TradeSide {
    #[default]
    Buy,
    Sell,
}

impl TradeSide {
    /// Wire value expected by the P2P search endpoint.
    pub fn as_provider_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_provider_str())
    }
}

impl FromStr for TradeSide {
    type Err = ParseTradeSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            _ => Err(ParseTradeSideError(s.to_string())),
        }
    }
}

/// Error parsing a trade side string.
#[derive(Debug, Clone)]
pub struct ParseTradeSideError(String);

impl fmt::Display for ParseTradeSideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid trade side '{}', expected 'BUY' or 'SELL'", self.0)
    }
}

impl std::error::Error for ParseTradeSideError {}

/// Query parameters selecting which orders a poll returns.
///
/// Built up by the conversational flow, then used verbatim for every
/// search request of a running monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Asset symbol, e.g. "USDT".
    pub asset: String,
    /// Fiat symbol, e.g. "UAH".
    pub fiat: String,
    /// Trade side the user is taking.
    pub side: TradeSide,
    /// Requested page size.
    pub rows: u32,
    /// Optional transaction-amount constraint.
    pub trans_amount: Option<Decimal>,
    /// Optional payment-method constraint.
    pub pay_method: Option<String>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            asset: "USDT".to_string(),
            fiat: "UAH".to_string(),
            side: TradeSide::Buy,
            rows: 20,
            trans_amount: None,
            pay_method: None,
        }
    }
}

/// One row of a search result.
///
/// Rows arrive in provider rank order, best price first. That ordering is
/// load-bearing for price matching and must never be re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Advertiser display name.
    pub advertiser: String,
    /// Unit price.
    pub price: Decimal,
    /// Accepted payment-method identifiers.
    pub pay_methods: Vec<String>,
}
