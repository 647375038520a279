//! Edge estimation for one prop.

use std::sync::Arc;
use std::time::Duration;

use common::config::LlmConfig;
use common::{AnalysisEstimate, EdgeResult, EstimatorOutcome, OutcomeKey, TrendEstimate};
use serde_json::Value;
use strategy::{CacheNamespace, EdgeScorer, FreshnessCache};
use tracing::{debug, instrument, warn};

use crate::client::OpenRouterClient;
use crate::types::ChatMessage;

pub const ANALYST_INSTRUCTIONS: &str = r#"You are an expert NBA betting analyst.
Analyze the player prop and return ONLY a JSON object.

Calculate edge as follows:
1. Implied Probability = 1 / Odds
2. Your Estimated Win Probability based on trends and matchup
3. Edge Percentage = Estimated Win % - Implied Probability

CRITICAL: Return edge_percentage as a DECIMAL (e.g., 0.10 for 10%, NOT 10.0).

Response format:
{
    "edge_percentage": 0.12,
    "rating": "SMASH",
    "confidence": "High",
    "reasoning": "brief explanation"
}

Rating rules:
- SMASH: edge >= 0.10 (10%+)
- LEAN: edge >= 0.03 and < 0.10 (3-9%)
- PASS: edge >= 0.00 and < 0.03 (0-2%)
- FADE: edge < 0.00 (negative edge)

Return ONLY valid JSON, no other text."#;

pub struct PropAnalyst {
    client: Arc<OpenRouterClient>,
    model: String,
    timeout: Duration,
    temperature: f64,
    cache: Arc<FreshnessCache>,
    scorer: EdgeScorer,
}

impl PropAnalyst {
    pub fn new(
        cfg: &LlmConfig,
        client: Arc<OpenRouterClient>,
        cache: Arc<FreshnessCache>,
        scorer: EdgeScorer,
    ) -> Self {
        Self {
            client,
            model: cfg.analysis_model.clone(),
            timeout: Duration::from_secs(cfg.analysis_timeout_secs),
            temperature: cfg.analysis_temperature,
            cache,
            scorer,
        }
    }

    pub fn cache_key(key: &OutcomeKey, price: f64) -> String {
        CacheNamespace::Analysis.key(&format!(
            "{}_{}_{}_{:.2}_{}",
            key.player, key.stat, key.line, price, key.side
        ))
    }

    /// Scored edge for `key` at `price`. Always returns a result; failures
    /// yield the simulated placeholder, which is never cached.
    #[instrument(skip(self, trends), fields(player = %key.player))]
    pub async fn analyze_prop(
        &self,
        key: &OutcomeKey,
        price: f64,
        trends: &TrendEstimate,
    ) -> EdgeResult {
        let cache_key = Self::cache_key(key, price);
        if let Some(cached) = self.cache.get::<EdgeResult>(&cache_key) {
            debug!("analysis served from cache");
            return cached;
        }

        let seed = key.to_string();
        if !self.client.is_configured() {
            return self.scorer.simulated(&seed);
        }

        let outcome = self.request_analysis(key, price, trends).await;
        let result = self.scorer.resolve(outcome, &seed);

        if !result.simulated {
            if let Err(e) = self.cache.put(&cache_key, &result) {
                warn!("failed to cache analysis: {}", e);
            }
        }
        result
    }

    pub async fn request_analysis(
        &self,
        key: &OutcomeKey,
        price: f64,
        trends: &TrendEstimate,
    ) -> EstimatorOutcome<AnalysisEstimate> {
        let messages = vec![
            ChatMessage::system(ANALYST_INSTRUCTIONS),
            ChatMessage::user(build_analysis_prompt(key, price, trends)),
        ];
        match self
            .client
            .complete(&self.model, messages, Some(self.temperature), self.timeout)
            .await
        {
            Ok(text) => parse_analysis_text(&text),
            Err(e) => e.into_outcome(),
        }
    }
}

pub fn build_analysis_prompt(key: &OutcomeKey, price: f64, trends: &TrendEstimate) -> String {
    let implied = EdgeScorer::implied_probability(price);
    format!(
        "Analyze this NBA player prop:\n\n\
         PLAYER: {player}\n\
         STAT: {stat}\n\
         LINE: {side} {line}\n\
         ODDS: {price} (Implied: {implied:.1}%)\n\n\
         TREND DATA:\n\
         - Last 10 Hit Rate: {hit:.0}%\n\
         - Trend: {trend}\n\
         - Injury Concern: {injury}\n\n\
         Return ONLY the required JSON with edge_percentage as DECIMAL.\n\
         Keep reasoning concise - maximum 60 words.",
        player = key.player,
        stat = key.stat,
        side = key.side.label().to_ascii_uppercase(),
        line = key.line,
        price = price,
        implied = implied * 100.0,
        hit = trends.last_10_hit_rate * 100.0,
        trend = trends.trend_direction,
        injury = trends.has_injury_concern,
    )
}

/// Slice from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Decode model text into an estimate. A missing or non-numeric
/// `edge_percentage` is a parse failure.
pub fn parse_analysis_text(text: &str) -> EstimatorOutcome<AnalysisEstimate> {
    let Some(json) = extract_json_object(text) else {
        return EstimatorOutcome::ParseFailure("no JSON object in response".into());
    };
    let value: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => return EstimatorOutcome::ParseFailure(e.to_string()),
    };

    let edge = match value.get("edge_percentage") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    let Some(edge_percentage) = edge.filter(|e| e.is_finite()) else {
        return EstimatorOutcome::ParseFailure("missing numeric edge_percentage".into());
    };

    let text_field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

    EstimatorOutcome::Success(AnalysisEstimate {
        edge_percentage,
        rating: text_field("rating"),
        confidence: text_field("confidence"),
        reasoning: text_field("reasoning"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BetSide, Rating, StatKind};

    fn key() -> OutcomeKey {
        OutcomeKey::new("LeBron James", StatKind::Points, BetSide::Over, 28.5)
    }

    fn analyst(api_key: &str, cache: Arc<FreshnessCache>) -> PropAnalyst {
        let cfg = LlmConfig {
            base_url: "http://127.0.0.1:9/v1/chat/completions".into(),
            analysis_timeout_secs: 2,
            ..LlmConfig::default()
        };
        let client = Arc::new(OpenRouterClient::new(&cfg, api_key).unwrap().with_max_retries(0));
        PropAnalyst::new(&cfg, client, cache, EdgeScorer::default())
    }

    #[test]
    fn test_extract_json_object() {
        let text = "Sure! ```json\n{\"edge_percentage\": 0.05, \"nested\": {\"a\": 1}}\n``` done";
        assert_eq!(
            extract_json_object(text),
            Some("{\"edge_percentage\": 0.05, \"nested\": {\"a\": 1}}")
        );
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_full_response() {
        let out = parse_analysis_text(
            r#"{"edge_percentage": 0.12, "rating": "SMASH",
                "confidence": "High", "reasoning": "Pace up"}"#,
        );
        let est = out.success().unwrap();
        assert!((est.edge_percentage - 0.12).abs() < 1e-12);
        assert_eq!(est.rating.as_deref(), Some("SMASH"));
        assert_eq!(est.reasoning.as_deref(), Some("Pace up"));
    }

    #[test]
    fn test_parse_string_and_percent_edges() {
        let est = parse_analysis_text(r#"{"edge_percentage": "8%"}"#).success().unwrap();
        assert!((est.edge_percentage - 8.0).abs() < 1e-12);
        assert!(est.rating.is_none());
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(parse_analysis_text(""), EstimatorOutcome::ParseFailure(_)));
        assert!(matches!(parse_analysis_text("{not json}"), EstimatorOutcome::ParseFailure(_)));
        assert!(matches!(
            parse_analysis_text(r#"{"rating": "SMASH"}"#),
            EstimatorOutcome::ParseFailure(_)
        ));
    }

    #[test]
    fn test_percent_scale_response_scores_as_decimal() {
        let est = parse_analysis_text(r#"{"edge_percentage": 12, "rating": "MEGA"}"#)
            .success()
            .unwrap();
        let r = EdgeScorer::default().score_estimate(&est);
        assert!((r.edge_percentage - 0.12).abs() < 1e-12);
        assert_eq!(r.rating, Rating::Smash);
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(
            PropAnalyst::cache_key(&key(), 1.9),
            "analysis_LeBron James_PTS_28.5_1.90_Over"
        );
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = build_analysis_prompt(&key(), 1.91, &TrendEstimate::neutral());
        assert!(prompt.contains("LINE: OVER 28.5"));
        assert!(prompt.contains("Implied: 52.4%"));
        assert!(prompt.contains("Last 10 Hit Rate: 50%"));
    }

    #[tokio::test]
    async fn test_unconfigured_analyst_simulates() {
        let cache = Arc::new(FreshnessCache::in_memory(CacheNamespace::Analysis, 60));
        let r = analyst("", cache.clone())
            .analyze_prop(&key(), 1.95, &TrendEstimate::neutral())
            .await;
        assert!(r.simulated);
        assert_eq!(r.reasoning, "Simulated analysis");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_simulates_without_caching() {
        let cache = Arc::new(FreshnessCache::in_memory(CacheNamespace::Analysis, 60));
        let r = analyst("live-key", cache.clone())
            .analyze_prop(&key(), 1.95, &TrendEstimate::neutral())
            .await;
        assert!(r.simulated);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cached_result_served_first() {
        let cache = Arc::new(FreshnessCache::in_memory(CacheNamespace::Analysis, 60));
        let stored = EdgeScorer::default().score(1.95, 0.65);
        cache.put(&PropAnalyst::cache_key(&key(), 1.95), &stored).unwrap();

        let r = analyst("live-key", cache)
            .analyze_prop(&key(), 1.95, &TrendEstimate::neutral())
            .await;
        assert_eq!(r, stored);
    }
}
