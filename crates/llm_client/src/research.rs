//! Recent-form research for one prop.

use std::sync::Arc;
use std::time::Duration;

use common::config::LlmConfig;
use common::{BetSide, EstimatorOutcome, StatKind, TrendDirection, TrendEstimate};
use sha2::{Digest, Sha256};
use strategy::{CacheNamespace, FreshnessCache};
use tracing::{debug, instrument, warn};

use crate::client::OpenRouterClient;
use crate::types::ChatMessage;

const IMPROVING_WORDS: &[&str] = &["improving", "hot", "up"];
const DECLINING_WORDS: &[&str] = &["declining", "cold", "down", "struggling"];
const INJURY_WORDS: &[&str] = &["injury", "injured", "doubtful"];

const SIMULATED_HIT_RATES: [f64; 5] = [0.4, 0.5, 0.6, 0.7, 0.8];
const SIMULATED_DIRECTIONS: [TrendDirection; 3] =
    [TrendDirection::Improving, TrendDirection::Stable, TrendDirection::Declining];

pub struct TrendResearcher {
    client: Arc<OpenRouterClient>,
    model: String,
    timeout: Duration,
    cache: Arc<FreshnessCache>,
}

impl TrendResearcher {
    pub fn new(cfg: &LlmConfig, client: Arc<OpenRouterClient>, cache: Arc<FreshnessCache>) -> Self {
        Self {
            client,
            model: cfg.research_model.clone(),
            timeout: Duration::from_secs(cfg.research_timeout_secs),
            cache,
        }
    }

    pub fn cache_key(player: &str, stat: StatKind, side: BetSide, line: f64) -> String {
        CacheNamespace::Trends.key(&format!("{player}_{stat}_{side}_{line}"))
    }

    /// Cached estimate, else live research, else a simulated estimate.
    #[instrument(skip(self), fields(player = %player))]
    pub async fn get_player_trends(
        &self,
        player: &str,
        stat: StatKind,
        side: BetSide,
        line: f64,
    ) -> TrendEstimate {
        let key = Self::cache_key(player, stat, side, line);
        if let Some(cached) = self.cache.get::<TrendEstimate>(&key) {
            debug!("trends served from cache");
            return cached;
        }

        if !self.client.is_configured() {
            return simulate_trends(player, stat, side, line);
        }

        match self.request_trends(player, stat, side, line).await {
            EstimatorOutcome::Success(estimate) => {
                if let Err(e) = self.cache.put(&key, &estimate) {
                    warn!("failed to cache trends: {}", e);
                }
                estimate
            }
            EstimatorOutcome::ParseFailure(reason) | EstimatorOutcome::TransportFailure(reason) => {
                warn!("trend research unavailable ({}), using simulated trends", reason);
                simulate_trends(player, stat, side, line)
            }
        }
    }

    pub async fn request_trends(
        &self,
        player: &str,
        stat: StatKind,
        side: BetSide,
        line: f64,
    ) -> EstimatorOutcome<TrendEstimate> {
        let prompt = build_research_prompt(player, stat, side, line);
        match self
            .client
            .complete(&self.model, vec![ChatMessage::user(prompt)], None, self.timeout)
            .await
        {
            Ok(text) => EstimatorOutcome::Success(parse_trend_text(&text)),
            Err(e) => e.into_outcome(),
        }
    }
}

pub fn build_research_prompt(player: &str, stat: StatKind, side: BetSide, line: f64) -> String {
    format!(
        "Search for {player}'s recent performance data for {side} {line} {stat}.\n\n\
         Provide:\n\
         1. Last 10 games hit rate (e.g., \"7 out of 10\")\n\
         2. Recent trend direction (Improving/Declining/Stable)\n\
         3. Any injuries or load management concerns\n\
         4. Matchup difficulty for {stat}\n\n\
         Be concise. Provide data points only.",
        side = side.label().to_ascii_uppercase(),
    )
}

/// Turn free research text into an estimate. Never fails: text without
/// recognisable data yields a neutral 0.5 hit rate.
pub fn parse_trend_text(text: &str) -> TrendEstimate {
    let lower = text.to_ascii_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let hit_rate = find_out_of_ten(&lower)
        .map(|hits| hits / 10.0)
        .or_else(|| find_percent(&lower).map(|pct| pct / 100.0))
        .unwrap_or(0.5)
        .clamp(0.0, 1.0);

    let has_any = |set: &[&str]| words.iter().any(|w| set.contains(w));
    let trend_direction = if has_any(IMPROVING_WORDS) {
        TrendDirection::Improving
    } else if has_any(DECLINING_WORDS) {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    // "out" signals a missed game, not the "7 out of 10" phrasing.
    let ruled_out = words
        .iter()
        .enumerate()
        .any(|(i, w)| *w == "out" && words.get(i + 1) != Some(&"of"));

    TrendEstimate {
        last_10_hit_rate: hit_rate,
        trend_direction,
        has_injury_concern: has_any(INJURY_WORDS) || ruled_out,
        raw_notes: text.chars().take(TrendEstimate::MAX_NOTES_CHARS).collect(),
        simulated: false,
    }
}

/// First "N out of 10" (any spacing), as N.
fn find_out_of_ten(lower: &str) -> Option<f64> {
    let bytes = lower.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let rest = &lower[i..];
        if let Some(after) = strip_words(rest, &["out", "of", "10"]) {
            if !after.starts_with(|c: char| c.is_ascii_digit()) {
                return lower[start..i].parse().ok();
            }
        }
    }
    None
}

fn strip_words<'a>(mut s: &'a str, words: &[&str]) -> Option<&'a str> {
    for w in words {
        s = s.trim_start().strip_prefix(w)?;
    }
    Some(s)
}

/// First number directly followed by '%'.
fn find_percent(lower: &str) -> Option<f64> {
    for (idx, _) in lower.match_indices('%') {
        let head = &lower[..idx];
        let start = head
            .char_indices()
            .rev()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
            .map(|(p, c)| p + c.len_utf8())
            .unwrap_or(0);
        let num = head[start..].trim_start_matches('.');
        if let Ok(v) = num.parse::<f64>() {
            return Some(v);
        }
    }
    None
}

/// Deterministic stand-in keyed on player, stat and side.
pub fn simulate_trends(player: &str, stat: StatKind, side: BetSide, line: f64) -> TrendEstimate {
    let digest = Sha256::digest(format!("{player}_{stat}_{side}").as_bytes());
    let hit_rate = SIMULATED_HIT_RATES[digest[0] as usize % SIMULATED_HIT_RATES.len()];
    let trend_direction = SIMULATED_DIRECTIONS[digest[1] as usize % SIMULATED_DIRECTIONS.len()];
    // ~15% of players.
    let has_injury_concern = digest[2] < 38;

    TrendEstimate {
        last_10_hit_rate: hit_rate,
        trend_direction,
        has_injury_concern,
        raw_notes: format!(
            "Simulated: {}/10 {} {} {}",
            (hit_rate * 10.0).round() as u32,
            side,
            line,
            stat
        ),
        simulated: true,
    }
}
