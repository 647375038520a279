//! OpenRouter-backed estimators.
//!
//! A shared chat-completions client plus the two callers built on it: the
//! trend researcher and the prop analyst. Both decode provider text into
//! tagged outcomes at this boundary and fall back to deterministic
//! simulated estimates on any failure.

pub mod analyst;
pub mod client;
pub mod rate_limit;
pub mod research;
pub mod types;

pub use analyst::{extract_json_object, parse_analysis_text, PropAnalyst, ANALYST_INSTRUCTIONS};
pub use client::OpenRouterClient;
pub use rate_limit::RequestLimiter;
pub use research::{parse_trend_text, simulate_trends, TrendResearcher};
pub use types::{ChatError, ChatMessage};
