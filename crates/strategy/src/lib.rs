//! Edge-scoring and line-shopping engine.
//!
//! Indexes quotes across books, finds the best price per outcome, turns
//! probability estimates into bounded edges and fractional-Kelly stakes,
//! and orders the results for display.

pub mod cache;
pub mod edge;
pub mod kelly;
pub mod line_shop;
pub mod quote_store;
pub mod ranker;
pub mod report;

pub use cache::{CacheEntry, CacheNamespace, FreshnessCache};
pub use edge::{EdgeScorer, RatingPolicy};
pub use kelly::{kelly_stake, StakeCalculator};
pub use line_shop::LineShopper;
pub use quote_store::OddsQuoteStore;
pub use ranker::{RankMode, RankSummary, ResultRanker};
pub use report::PropRow;
