//! Application configuration types.
//!
//! Built once at start-up and handed to each component by reference.

use serde::{Deserialize, Serialize};

/// Longest accepted cache TTL: one year.
pub const MAX_TTL_MINUTES: i64 = 525_600;

/// Keys equal to this value are treated as unset.
pub const PLACEHOLDER_KEY: &str = "PLACEHOLDER";

/// Returns true when an API key is present and not a placeholder.
pub fn key_is_configured(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && trimmed != PLACEHOLDER_KEY
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The Odds API key.
    #[serde(default)]
    pub odds_api_key: String,

    /// OpenRouter API key, used for both research and analysis.
    #[serde(default)]
    pub openrouter_api_key: String,

    #[serde(default)]
    pub odds: OddsConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub workers: WorkerConfig,
}

/// Odds provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsConfig {
    #[serde(default = "default_odds_base_url")]
    pub base_url: String,
    #[serde(default = "default_sport_key")]
    pub sport_key: String,
    /// Comma-separated regions; several regions widen line shopping.
    #[serde(default = "default_regions")]
    pub regions: String,
    #[serde(default = "default_markets")]
    pub markets: String,
    #[serde(default = "default_odds_format")]
    pub odds_format: String,
    #[serde(default = "default_odds_timeout")]
    pub timeout_secs: u64,
}

/// OpenRouter settings shared by the researcher and the analyst.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_research_model")]
    pub research_model: String,
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    /// Sent as HTTP-Referer.
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_research_timeout")]
    pub research_timeout_secs: u64,
    #[serde(default = "default_analysis_timeout")]
    pub analysis_timeout_secs: u64,
    #[serde(default = "default_analysis_temperature")]
    pub analysis_temperature: f64,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

/// Scoring and sizing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Fraction of full Kelly to stake (0.25 = quarter Kelly).
    #[serde(default = "default_risk_multiplier")]
    pub risk_multiplier: f64,
    #[serde(default = "default_smash_threshold")]
    pub smash_threshold: f64,
    #[serde(default = "default_lean_threshold")]
    pub lean_threshold: f64,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    #[serde(default = "default_edge_floor")]
    pub edge_floor: f64,
    #[serde(default = "default_edge_ceiling")]
    pub edge_ceiling: f64,
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives_shown: usize,
    #[serde(default = "default_max_props")]
    pub max_props_per_scan: usize,
    #[serde(default = "default_reasoning_chars")]
    pub reasoning_display_chars: usize,
}

/// Persisted cache location and per-namespace freshness windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    #[serde(default = "default_schedule_ttl")]
    pub schedule_ttl_minutes: i64,
    #[serde(default = "default_props_ttl")]
    pub props_ttl_minutes: i64,
    #[serde(default = "default_trends_ttl")]
    pub trends_ttl_minutes: i64,
    #[serde(default = "default_analysis_ttl")]
    pub analysis_ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Concurrent props in batch mode. Bounds external API load.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_odds_base_url() -> String {
    "https://api.the-odds-api.com/v4/sports".into()
}
fn default_sport_key() -> String {
    "basketball_nba".into()
}
fn default_regions() -> String {
    "us,eu,uk,us2".into()
}
fn default_markets() -> String {
    "player_points,player_rebounds,player_assists".into()
}
fn default_odds_format() -> String {
    "decimal".into()
}
fn default_odds_timeout() -> u64 {
    30
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".into()
}
fn default_research_model() -> String {
    "perplexity/sonar".into()
}
fn default_analysis_model() -> String {
    "deepseek/deepseek-chat".into()
}
fn default_referer() -> String {
    "https://propgem.app".into()
}
fn default_research_timeout() -> u64 {
    60
}
fn default_analysis_timeout() -> u64 {
    90
}
fn default_analysis_temperature() -> f64 {
    0.3
}
fn default_requests_per_minute() -> u32 {
    60
}

fn default_risk_multiplier() -> f64 {
    0.25
}
fn default_smash_threshold() -> f64 {
    0.10
}
fn default_lean_threshold() -> f64 {
    0.03
}
fn default_pass_threshold() -> f64 {
    0.00
}
fn default_edge_floor() -> f64 {
    -0.20
}
fn default_edge_ceiling() -> f64 {
    0.30
}
fn default_max_alternatives() -> usize {
    3
}
fn default_max_props() -> usize {
    30
}
fn default_reasoning_chars() -> usize {
    150
}

fn default_cache_dir() -> String {
    ".".into()
}
fn default_schedule_ttl() -> i64 {
    360
}
fn default_props_ttl() -> i64 {
    15
}
fn default_trends_ttl() -> i64 {
    60
}
fn default_analysis_ttl() -> i64 {
    60
}

fn default_max_workers() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            odds_api_key: String::new(),
            openrouter_api_key: String::new(),
            odds: OddsConfig::default(),
            llm: LlmConfig::default(),
            strategy: StrategyConfig::default(),
            cache: CacheConfig::default(),
            workers: WorkerConfig::default(),
        }
    }
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            base_url: default_odds_base_url(),
            sport_key: default_sport_key(),
            regions: default_regions(),
            markets: default_markets(),
            odds_format: default_odds_format(),
            timeout_secs: default_odds_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            research_model: default_research_model(),
            analysis_model: default_analysis_model(),
            referer: default_referer(),
            research_timeout_secs: default_research_timeout(),
            analysis_timeout_secs: default_analysis_timeout(),
            analysis_temperature: default_analysis_temperature(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            risk_multiplier: default_risk_multiplier(),
            smash_threshold: default_smash_threshold(),
            lean_threshold: default_lean_threshold(),
            pass_threshold: default_pass_threshold(),
            edge_floor: default_edge_floor(),
            edge_ceiling: default_edge_ceiling(),
            max_alternatives_shown: default_max_alternatives(),
            max_props_per_scan: default_max_props(),
            reasoning_display_chars: default_reasoning_chars(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            schedule_ttl_minutes: default_schedule_ttl(),
            props_ttl_minutes: default_props_ttl(),
            trends_ttl_minutes: default_trends_ttl(),
            analysis_ttl_minutes: default_analysis_ttl(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}
