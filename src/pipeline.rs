//! Per-prop processing and the two run modes built on it.

use std::collections::HashMap;
use std::sync::Arc;

use common::config::AppConfig;
use common::{Error, Quote, Result, ScoredProp, StatKind};
use futures_util::stream::{self, StreamExt};
use llm_client::{OpenRouterClient, PropAnalyst, TrendResearcher};
use strategy::{
    CacheNamespace, EdgeScorer, FreshnessCache, LineShopper, OddsQuoteStore, StakeCalculator,
};
use tracing::{debug, info, warn};

/// Trends → best price → analysis → stake, for one quote at a time.
pub struct Pipeline {
    researcher: TrendResearcher,
    analyst: PropAnalyst,
    shopper: LineShopper,
    stakes: StakeCalculator,
}

impl Pipeline {
    pub fn new(researcher: TrendResearcher, analyst: PropAnalyst, cfg: &AppConfig) -> Self {
        Self {
            researcher,
            analyst,
            shopper: LineShopper::new(cfg.strategy.max_alternatives_shown),
            stakes: StakeCalculator::new(&cfg.strategy),
        }
    }

    /// Wire the estimators from config, opening their caches under
    /// `cfg.cache.dir`.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let client = Arc::new(OpenRouterClient::new(&cfg.llm, &cfg.openrouter_api_key)?);
        let trends_cache = Arc::new(FreshnessCache::open(
            &cfg.cache.dir,
            CacheNamespace::Trends,
            cfg.cache.trends_ttl_minutes,
        ));
        let analysis_cache = Arc::new(FreshnessCache::open(
            &cfg.cache.dir,
            CacheNamespace::Analysis,
            cfg.cache.analysis_ttl_minutes,
        ));

        let researcher = TrendResearcher::new(&cfg.llm, Arc::clone(&client), trends_cache);
        let analyst = PropAnalyst::new(
            &cfg.llm,
            client,
            analysis_cache,
            EdgeScorer::new(&cfg.strategy),
        );
        Ok(Self::new(researcher, analyst, cfg))
    }

    /// Score one quote. The edge is computed at the best price any book
    /// offers for the same outcome; the quote's own book and price are
    /// kept for display.
    pub async fn process_prop(&self, quote: &Quote, store: &OddsQuoteStore) -> Result<ScoredProp> {
        if quote.player.trim().is_empty() {
            return Err(Error::Other("quote has no player".into()));
        }
        if !quote.price.is_finite() {
            return Err(Error::Other(format!("{}: non-finite price", quote.player)));
        }

        let trends = self
            .researcher
            .get_player_trends(&quote.player, quote.stat, quote.side, quote.line)
            .await;

        let key = quote.outcome_key();
        let best_price = LineShopper::best_price(store, &key, quote.price);
        let alternatives = self
            .shopper
            .better_alternatives(store, &key, &quote.book, quote.price);

        let edge = self.analyst.analyze_prop(&key, best_price, &trends).await;
        let true_win = EdgeScorer::true_win_probability(best_price, edge.edge_percentage);
        let stake = self.stakes.recommend(true_win, best_price);

        debug!(
            "{} {} {}: best={:.2} edge={:.4} rating={} kelly={:.4}",
            quote.player,
            quote.stat,
            quote.line,
            best_price,
            edge.edge_percentage,
            edge.rating,
            stake.kelly_fraction
        );

        Ok(ScoredProp {
            quote: quote.clone(),
            best_price,
            alternatives,
            trends,
            edge,
            stake,
        })
    }
}

/// Process `props` concurrently, at most `max_workers` in flight. Failed
/// items are logged and left out; output order is completion order.
pub async fn run_batch(
    pipeline: Arc<Pipeline>,
    store: Arc<OddsQuoteStore>,
    props: Vec<Quote>,
    max_workers: usize,
) -> Vec<ScoredProp> {
    let total = props.len();
    let mut completed = 0usize;
    let mut results = Vec::with_capacity(total);

    let mut tasks = stream::iter(props.into_iter().map(|quote| {
        let pipeline = Arc::clone(&pipeline);
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let player = quote.player.clone();
            (player, pipeline.process_prop(&quote, &store).await)
        })
    }))
    .buffer_unordered(max_workers.max(1));

    while let Some(joined) = tasks.next().await {
        completed += 1;
        match joined {
            Ok((_, Ok(scored))) => results.push(scored),
            Ok((player, Err(e))) => warn!("failed to process {}: {}", player, e),
            Err(e) => warn!("prop task aborted: {}", e),
        }
        if completed % 5 == 0 || completed == total {
            info!("progress: {}/{} complete", completed, total);
        }
    }

    results
}

/// Process `props` one at a time, reporting after each item.
pub async fn run_sequential(
    pipeline: &Pipeline,
    store: &OddsQuoteStore,
    props: &[Quote],
    mut on_progress: impl FnMut(usize, usize, &ScoredProp),
) -> Vec<ScoredProp> {
    let total = props.len();
    let mut results = Vec::with_capacity(total);

    for (i, quote) in props.iter().enumerate() {
        match pipeline.process_prop(quote, store).await {
            Ok(scored) => {
                on_progress(i + 1, total, &scored);
                results.push(scored);
            }
            Err(e) => warn!("failed to process {}: {}", quote.player, e),
        }
    }

    results
}

/// Batch selection: optional book filter, then one quote per
/// (player, stat) keeping the highest price. First-seen order.
pub fn select_batch_props(quotes: &[Quote], book: Option<&str>) -> Vec<Quote> {
    let mut slots: HashMap<(String, StatKind), usize> = HashMap::new();
    let mut picked: Vec<Quote> = Vec::new();

    for q in quotes.iter().filter(|q| book.map_or(true, |b| q.book == b)) {
        match slots.get(&(q.player.clone(), q.stat)) {
            Some(&idx) => {
                if q.price > picked[idx].price {
                    picked[idx] = q.clone();
                }
            }
            None => {
                slots.insert((q.player.clone(), q.stat), picked.len());
                picked.push(q.clone());
            }
        }
    }

    picked
}

/// Interactive selection: the chosen book's quotes, or the first quote per
/// outcome across all books; highest price first, capped at `limit`.
pub fn select_interactive_props(
    store: &OddsQuoteStore,
    book: Option<&str>,
    limit: usize,
) -> Vec<Quote> {
    let mut props = match book {
        Some(b) => store.quotes_from_book(b),
        None => store.first_per_outcome(),
    };
    props.sort_by(|a, b| b.price.total_cmp(&a.price));
    props.truncate(limit);
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::LlmConfig;
    use common::BetSide;

    fn quote(player: &str, stat: StatKind, line: f64, price: f64, book: &str) -> Quote {
        Quote {
            player: player.into(),
            stat,
            side: BetSide::Over,
            line,
            price,
            book: book.into(),
            book_key: book.to_ascii_lowercase(),
            event_id: "demo1".into(),
            matchup: "Demo Game".into(),
            commence_time: String::new(),
        }
    }

    fn demo_quotes() -> Vec<Quote> {
        vec![
            quote("LeBron James", StatKind::Points, 28.5, 1.91, "DraftKings"),
            quote("LeBron James", StatKind::Points, 28.5, 1.95, "Bet365"),
            quote("Jayson Tatum", StatKind::Points, 26.5, 1.91, "DraftKings"),
            quote("Jayson Tatum", StatKind::Rebounds, 8.5, 1.91, "DraftKings"),
        ]
    }

    /// Unconfigured estimators with in-memory caches: fully deterministic.
    fn offline_pipeline() -> Pipeline {
        let cfg = AppConfig::default();
        let llm = LlmConfig::default();
        let client = Arc::new(OpenRouterClient::new(&llm, "").unwrap());
        let researcher = TrendResearcher::new(
            &llm,
            Arc::clone(&client),
            Arc::new(FreshnessCache::in_memory(CacheNamespace::Trends, 60)),
        );
        let analyst = PropAnalyst::new(
            &llm,
            client,
            Arc::new(FreshnessCache::in_memory(CacheNamespace::Analysis, 60)),
            EdgeScorer::default(),
        );
        Pipeline::new(researcher, analyst, &cfg)
    }

    #[test]
    fn test_batch_selection_keeps_best_price_per_player_stat() {
        let picked = select_batch_props(&demo_quotes(), None);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0].player, "LeBron James");
        assert_eq!(picked[0].book, "Bet365");
        assert_eq!(picked[1].stat, StatKind::Points);
        assert_eq!(picked[2].stat, StatKind::Rebounds);
    }

    #[test]
    fn test_batch_selection_book_filter() {
        let picked = select_batch_props(&demo_quotes(), Some("Bet365"));
        assert_eq!(picked.len(), 1);
        assert!(select_batch_props(&demo_quotes(), Some("FanDuel")).is_empty());
    }

    #[test]
    fn test_interactive_selection() {
        let store = OddsQuoteStore::build(demo_quotes());

        let all = select_interactive_props(&store, None, 30);
        assert_eq!(all.len(), 3);
        // First-seen per outcome: LeBron stays on DraftKings.
        assert!(all.iter().any(|q| q.player == "LeBron James" && q.book == "DraftKings"));

        let dk = select_interactive_props(&store, Some("DraftKings"), 2);
        assert_eq!(dk.len(), 2);
    }

    #[test]
    fn test_interactive_selection_sorted_by_price() {
        let store = OddsQuoteStore::build(vec![
            quote("A", StatKind::Points, 10.5, 1.80, "X"),
            quote("B", StatKind::Points, 10.5, 2.10, "X"),
            quote("C", StatKind::Points, 10.5, 1.95, "X"),
        ]);
        let picked = select_interactive_props(&store, None, 30);
        let prices: Vec<f64> = picked.iter().map(|q| q.price).collect();
        assert_eq!(prices, vec![2.10, 1.95, 1.80]);
    }

    #[tokio::test]
    async fn test_process_prop_uses_best_price() {
        let pipeline = offline_pipeline();
        let quotes = demo_quotes();
        let store = OddsQuoteStore::build(quotes.clone());

        let scored = pipeline.process_prop(&quotes[0], &store).await.unwrap();
        assert_eq!(scored.quote.book, "DraftKings");
        assert_eq!(scored.best_price, 1.95);
        assert_eq!(scored.alternatives.len(), 1);
        assert_eq!(scored.alternatives[0].book, "Bet365");
        assert!(scored.edge.simulated);
        assert!(scored.trends.simulated);
        assert!(scored.stake.kelly_fraction >= 0.0);
        assert!((-0.20..=0.30).contains(&scored.edge.edge_percentage));
    }

    #[tokio::test]
    async fn test_process_prop_rejects_bad_quote() {
        let pipeline = offline_pipeline();
        let store = OddsQuoteStore::default();
        let bad = quote("", StatKind::Points, 20.5, 1.91, "X");
        assert!(pipeline.process_prop(&bad, &store).await.is_err());
    }

    #[tokio::test]
    async fn test_batch_excludes_failures_and_keeps_the_rest() {
        let pipeline = Arc::new(offline_pipeline());
        let mut props = select_batch_props(&demo_quotes(), None);
        props.push(quote("Ghost", StatKind::Assists, 5.5, f64::NAN, "X"));
        let store = Arc::new(OddsQuoteStore::build(demo_quotes()));

        let results = run_batch(pipeline, store, props, 2).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.quote.player != "Ghost"));
    }

    #[tokio::test]
    async fn test_sequential_reports_progress() {
        let pipeline = offline_pipeline();
        let store = OddsQuoteStore::build(demo_quotes());
        let props = select_interactive_props(&store, None, 30);

        let mut seen = Vec::new();
        let results = run_sequential(&pipeline, &store, &props, |done, total, _| {
            seen.push((done, total))
        })
        .await;
        assert_eq!(results.len(), 3);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }
}
