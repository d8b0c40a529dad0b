//! Price threshold watch rule.

use super::{TickOutcome, WatchRule};
use model::{Order, TradeSide};
use rust_decimal::Decimal;

/// Watches for the best-ranked price to cross a threshold.
///
/// Only the first row counts: the provider ranks best price first, and
/// the current best is never aggregated across pages. A buy-side watch
/// matches when the best price rises to or above the limit, a sell-side
/// watch when it falls to or below. A match ends the watch.
pub struct PriceRule {
    side: TradeSide,
    limit: Decimal,
}

impl PriceRule {
    pub fn new(side: TradeSide, limit: Decimal) -> Self {
        Self { side, limit }
    }
}

impl WatchRule for PriceRule {
    fn evaluate(&mut self, orders: &[Order]) -> TickOutcome {
        // An empty page is a silent tick, not a failure.
        let Some(best) = orders.first() else {
            return TickOutcome::Quiet;
        };

        let crossed = match self.side {
            TradeSide::Sell => best.price <= self.limit,
            TradeSide::Buy => best.price >= self.limit,
        };

        if crossed {
            TickOutcome::Finish {
                text: Some(format!(
                    "Monitoring stopped: Order matching the price {} found: {}",
                    self.limit, best.price
                )),
            }
        } else {
            TickOutcome::Quiet
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book(best: Decimal) -> Vec<Order> {
        vec![
            Order {
                advertiser: "best".to_string(),
                price: best,
                pay_methods: vec![],
            },
            Order {
                advertiser: "worse".to_string(),
                price: best + dec!(5),
                pay_methods: vec![],
            },
        ]
    }

    #[test]
    fn buy_side_matches_at_or_above_the_limit() {
        let mut rule = PriceRule::new(TradeSide::Buy, dec!(40.00));

        assert_eq!(rule.evaluate(&book(dec!(39.50))), TickOutcome::Quiet);

        match rule.evaluate(&book(dec!(40.00))) {
            TickOutcome::Finish { text } => assert_eq!(
                text.unwrap(),
                "Monitoring stopped: Order matching the price 40.00 found: 40.00"
            ),
            other => panic!("expected Finish, got {:?}", other),
        }
    }

    #[test]
    fn sell_side_matches_at_or_below_the_limit() {
        let mut rule = PriceRule::new(TradeSide::Sell, dec!(40.00));

        assert_eq!(rule.evaluate(&book(dec!(40.50))), TickOutcome::Quiet);
        assert!(matches!(
            rule.evaluate(&book(dec!(39.90))),
            TickOutcome::Finish { .. }
        ));
    }

    #[test]
    fn only_the_best_ranked_price_counts() {
        let mut rule = PriceRule::new(TradeSide::Buy, dec!(44.00));

        // Second row would match, first does not: no match.
        assert_eq!(rule.evaluate(&book(dec!(40.00))), TickOutcome::Quiet);
    }

    #[test]
    fn empty_book_is_a_silent_tick() {
        let mut rule = PriceRule::new(TradeSide::Buy, dec!(40.00));
        assert_eq!(rule.evaluate(&[]), TickOutcome::Quiet);
    }
}
