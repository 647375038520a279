//! In-memory index over one event's quotes.
//!
//! Built from scratch per event fetch; never mutated afterwards.

use std::collections::{BTreeSet, HashMap, HashSet};

use common::{BookPrice, OutcomeKey, Quote};

#[derive(Debug, Clone, Default)]
pub struct OddsQuoteStore {
    quotes: Vec<Quote>,
    index: HashMap<OutcomeKey, Vec<BookPrice>>,
}

impl OddsQuoteStore {
    /// Group quotes by outcome and sort each group best price first.
    ///
    /// Duplicate quotes from the same book are kept. Equal prices keep
    /// their input order.
    pub fn build(quotes: Vec<Quote>) -> Self {
        let mut index: HashMap<OutcomeKey, Vec<BookPrice>> = HashMap::new();

        for quote in &quotes {
            index.entry(quote.outcome_key()).or_default().push(BookPrice {
                book: quote.book.clone(),
                price: quote.price,
            });
        }

        for prices in index.values_mut() {
            // sort_by is stable.
            prices.sort_by(|a, b| b.price.total_cmp(&a.price));
        }

        Self { quotes, index }
    }

    /// Prices for `key`, best first. Empty when the outcome is unknown.
    pub fn lookup(&self, key: &OutcomeKey) -> &[BookPrice] {
        self.index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Number of distinct outcomes.
    pub fn outcome_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Sorted, de-duplicated book names.
    pub fn books(&self) -> Vec<String> {
        self.quotes
            .iter()
            .map(|q| q.book.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The first quote seen for each outcome, in input order.
    pub fn first_per_outcome(&self) -> Vec<Quote> {
        let mut seen = HashSet::new();
        self.quotes
            .iter()
            .filter(|q| seen.insert(q.outcome_key()))
            .cloned()
            .collect()
    }

    /// All quotes offered by `book`, in input order.
    pub fn quotes_from_book(&self, book: &str) -> Vec<Quote> {
        self.quotes.iter().filter(|q| q.book == book).cloned().collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use common::{BetSide, StatKind};

    pub(crate) fn quote(player: &str, line: f64, price: f64, book: &str) -> Quote {
        Quote {
            player: player.into(),
            stat: StatKind::Points,
            side: BetSide::Over,
            line,
            price,
            book: book.into(),
            book_key: book.to_ascii_lowercase(),
            event_id: "evt1".into(),
            matchup: "Los Angeles Lakers @ Boston Celtics".into(),
            commence_time: String::new(),
        }
    }

    fn key(player: &str, line: f64) -> OutcomeKey {
        OutcomeKey::new(player, StatKind::Points, BetSide::Over, line)
    }

    #[test]
    fn test_lookup_orders_best_price_first() {
        let store = OddsQuoteStore::build(vec![
            quote("LeBron James", 28.5, 1.91, "A"),
            quote("LeBron James", 28.5, 1.95, "B"),
            quote("LeBron James", 28.5, 1.88, "C"),
        ]);

        let prices: Vec<f64> = store
            .lookup(&key("LeBron James", 28.5))
            .iter()
            .map(|p| p.price)
            .collect();
        assert_eq!(prices, vec![1.95, 1.91, 1.88]);
    }

    #[test]
    fn test_lookup_missing_key_is_empty() {
        let store = OddsQuoteStore::build(vec![quote("LeBron James", 28.5, 1.91, "A")]);
        assert!(store.lookup(&key("LeBron James", 27.5)).is_empty());
        assert!(store.lookup(&key("Jayson Tatum", 28.5)).is_empty());
    }

    #[test]
    fn test_same_book_duplicates_kept_in_input_order() {
        let store = OddsQuoteStore::build(vec![
            quote("LeBron James", 28.5, 1.90, "A"),
            quote("LeBron James", 28.5, 1.90, "B"),
            quote("LeBron James", 28.5, 1.90, "A"),
        ]);

        let books: Vec<&str> = store
            .lookup(&key("LeBron James", 28.5))
            .iter()
            .map(|p| p.book.as_str())
            .collect();
        assert_eq!(books, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_sides_and_lines_are_separate_outcomes() {
        let mut under = quote("LeBron James", 28.5, 1.80, "A");
        under.side = BetSide::Under;
        let store = OddsQuoteStore::build(vec![
            quote("LeBron James", 28.5, 1.91, "A"),
            under,
            quote("LeBron James", 29.5, 2.05, "A"),
        ]);
        assert_eq!(store.outcome_count(), 3);
        assert_eq!(store.lookup(&key("LeBron James", 28.5)).len(), 1);
    }

    #[test]
    fn test_first_per_outcome_and_books() {
        let store = OddsQuoteStore::build(vec![
            quote("LeBron James", 28.5, 1.91, "DraftKings"),
            quote("LeBron James", 28.5, 1.95, "Bet365"),
            quote("Jayson Tatum", 26.5, 1.91, "DraftKings"),
        ]);

        let firsts = store.first_per_outcome();
        assert_eq!(firsts.len(), 2);
        assert_eq!(firsts[0].book, "DraftKings");
        assert_eq!(store.books(), vec!["Bet365".to_string(), "DraftKings".to_string()]);
        assert_eq!(store.quotes_from_book("Bet365").len(), 1);
    }
}
