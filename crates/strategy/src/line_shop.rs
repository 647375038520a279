//! Line shopping across books.

use common::{BetSide, BookPrice, OutcomeKey, Quote, StatKind};

use crate::quote_store::OddsQuoteStore;

/// Lines closer than this are treated as the same bet when the exact
/// index misses.
pub const NEAR_LINE_TOLERANCE: f64 = 0.5;

/// Shown when no book beats the reference price.
pub const NO_BETTER_PRICE: &str = "-";

#[derive(Debug, Clone)]
pub struct LineShopper {
    max_shown: usize,
}

impl LineShopper {
    pub fn new(max_shown: usize) -> Self {
        Self { max_shown }
    }

    /// Every other book strictly beating `reference_price`, best first.
    pub fn better_alternatives(
        &self,
        store: &OddsQuoteStore,
        key: &OutcomeKey,
        reference_book: &str,
        reference_price: f64,
    ) -> Vec<BookPrice> {
        store
            .lookup(key)
            .iter()
            .filter(|bp| bp.price > reference_price && bp.book != reference_book)
            .cloned()
            .collect()
    }

    /// `better_alternatives` truncated for display.
    pub fn best_alternatives(
        &self,
        store: &OddsQuoteStore,
        key: &OutcomeKey,
        reference_book: &str,
        reference_price: f64,
    ) -> Vec<BookPrice> {
        let mut alts = self.better_alternatives(store, key, reference_book, reference_price);
        alts.truncate(self.max_shown);
        alts
    }

    /// Best price across all books for `key`, or `fallback` when unknown.
    pub fn best_price(store: &OddsQuoteStore, key: &OutcomeKey, fallback: f64) -> f64 {
        store.lookup(key).first().map(|bp| bp.price).unwrap_or(fallback)
    }

    /// Best strictly-better quote for the same player, stat and side at a
    /// line within the tolerance. Ties keep the first quote seen.
    pub fn find_near_line<'a>(
        all_quotes: &'a [Quote],
        player: &str,
        stat: StatKind,
        side: BetSide,
        reference_line: f64,
        reference_price: f64,
    ) -> Option<&'a Quote> {
        let mut better: Option<&Quote> = None;
        for q in all_quotes {
            if q.player == player
                && q.stat == stat
                && q.side == side
                && (q.line - reference_line).abs() < NEAR_LINE_TOLERANCE
                && q.price > reference_price
                && better.map_or(true, |b| q.price > b.price)
            {
                better = Some(q);
            }
        }
        better
    }

    /// "Book: 1.95 | Other: 1.93", or the sentinel when empty.
    pub fn summarize(alternatives: &[BookPrice]) -> String {
        if alternatives.is_empty() {
            return NO_BETTER_PRICE.to_string();
        }
        alternatives
            .iter()
            .map(|bp| format!("{}: {:.2}", bp.book, bp.price))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote_store::tests::quote;

    fn key() -> OutcomeKey {
        OutcomeKey::new("LeBron James", StatKind::Points, BetSide::Over, 28.5)
    }

    fn scenario_store() -> OddsQuoteStore {
        OddsQuoteStore::build(vec![
            quote("LeBron James", 28.5, 1.91, "A"),
            quote("LeBron James", 28.5, 1.95, "B"),
            quote("LeBron James", 28.5, 1.88, "C"),
        ])
    }

    #[test]
    fn test_best_price_and_alternatives_scenario() {
        let store = scenario_store();
        let shopper = LineShopper::new(3);

        assert_eq!(LineShopper::best_price(&store, &key(), 1.91), 1.95);

        let alts = shopper.best_alternatives(&store, &key(), "A", 1.91);
        assert_eq!(
            alts,
            vec![BookPrice {
                book: "B".into(),
                price: 1.95
            }]
        );
    }

    #[test]
    fn test_best_price_falls_back_when_missing() {
        let store = OddsQuoteStore::default();
        assert_eq!(LineShopper::best_price(&store, &key(), 1.87), 1.87);
    }

    #[test]
    fn test_alternatives_truncate_for_display_only() {
        let store = OddsQuoteStore::build(vec![
            quote("LeBron James", 28.5, 1.80, "Ref"),
            quote("LeBron James", 28.5, 1.85, "A"),
            quote("LeBron James", 28.5, 1.90, "B"),
            quote("LeBron James", 28.5, 1.95, "C"),
            quote("LeBron James", 28.5, 2.00, "D"),
        ]);
        let shopper = LineShopper::new(3);

        let full = shopper.better_alternatives(&store, &key(), "Ref", 1.80);
        let shown = shopper.best_alternatives(&store, &key(), "Ref", 1.80);
        assert_eq!(full.len(), 4);
        assert_eq!(shown.len(), 3);
        assert_eq!(shown[0].book, "D");
    }

    #[test]
    fn test_reference_book_excluded_even_when_better() {
        let store = OddsQuoteStore::build(vec![
            quote("LeBron James", 28.5, 1.91, "A"),
            quote("LeBron James", 28.5, 1.99, "A"),
        ]);
        let alts = LineShopper::new(3).better_alternatives(&store, &key(), "A", 1.91);
        assert!(alts.is_empty());
    }

    #[test]
    fn test_find_near_line() {
        let quotes = vec![
            quote("LeBron James", 28.5, 1.91, "A"),
            quote("LeBron James", 28.5, 1.97, "B"),
            quote("LeBron James", 28.75, 1.99, "C"),
            quote("LeBron James", 29.0, 2.20, "D"), // exactly 0.5 away
            quote("Jayson Tatum", 28.5, 2.50, "E"),
        ];

        let near = |side: BetSide, price: f64| {
            let lebron = "LeBron James";
            LineShopper::find_near_line(&quotes, lebron, StatKind::Points, side, 28.5, price)
        };
        assert_eq!(near(BetSide::Over, 1.91).unwrap().book, "C");
        assert!(near(BetSide::Over, 2.5).is_none());
        assert!(near(BetSide::Under, 1.0).is_none());
    }

    #[test]
    fn test_summarize() {
        assert_eq!(LineShopper::summarize(&[]), "-");
        let alts = vec![
            BookPrice { book: "Bet365".into(), price: 1.95 },
            BookPrice { book: "FanDuel".into(), price: 1.926 },
        ];
        assert_eq!(LineShopper::summarize(&alts), "Bet365: 1.95 | FanDuel: 1.93");
    }
}
