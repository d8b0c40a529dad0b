//! Counterparty watch rule.

use super::{TickOutcome, WatchRule};
use model::Order;

/// Watches for a specific advertiser's order to appear, then disappear.
///
/// Appearance notifies once and keeps watching; repeated appearance and
/// disappearance is expected to be observed. Disappearance after an
/// appearance notifies and ends the watch.
pub struct CounterpartyRule {
    target: String,
    matched: bool,
}

impl CounterpartyRule {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            matched: false,
        }
    }
}

impl WatchRule for CounterpartyRule {
    fn evaluate(&mut self, orders: &[Order]) -> TickOutcome {
        let found = orders.iter().find(|o| o.advertiser == self.target);

        match (found, self.matched) {
            (Some(order), false) => {
                self.matched = true;
                TickOutcome::Notify {
                    text: format!(
                        "Found an order from user {}: {}",
                        self.target, order.price
                    ),
                    matched: Some(order.clone()),
                }
            }
            (None, true) => TickOutcome::Finish {
                text: Some(format!(
                    "The order from user {} has disappeared.",
                    self.target
                )),
            },
            _ => TickOutcome::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(advertiser: &str) -> Order {
        Order {
            advertiser: advertiser.to_string(),
            price: dec!(41.23),
            pay_methods: vec![],
        }
    }

    #[test]
    fn appearance_notifies_once_then_stays_quiet() {
        let mut rule = CounterpartyRule::new("trader1");
        let book = vec![order("other"), order("trader1")];

        match rule.evaluate(&book) {
            TickOutcome::Notify { text, matched } => {
                assert_eq!(text, "Found an order from user trader1: 41.23");
                assert_eq!(matched.unwrap().advertiser, "trader1");
            }
            other => panic!("expected Notify, got {:?}", other),
        }

        // Still present: no repeat notification.
        assert_eq!(rule.evaluate(&book), TickOutcome::Quiet);
    }

    #[test]
    fn disappearance_after_match_finishes_the_watch() {
        let mut rule = CounterpartyRule::new("trader1");

        rule.evaluate(&[order("trader1")]);
        match rule.evaluate(&[order("other")]) {
            TickOutcome::Finish { text } => {
                assert_eq!(
                    text.unwrap(),
                    "The order from user trader1 has disappeared."
                );
            }
            other => panic!("expected Finish, got {:?}", other),
        }
    }

    #[test]
    fn absence_before_any_match_is_quiet() {
        let mut rule = CounterpartyRule::new("trader1");

        assert_eq!(rule.evaluate(&[order("other")]), TickOutcome::Quiet);
        assert_eq!(rule.evaluate(&[]), TickOutcome::Quiet);
    }
}
