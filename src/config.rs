//! Configuration loader: merges .env, config.toml and environment overrides.

use common::config::{AppConfig, MAX_TTL_MINUTES};
use common::Error;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn parse_positive_f64(raw: &str, env_name: &str) -> Result<f64, Error> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Config(format!("{env_name} must be a number > 0")))?;
    if !(parsed > 0.0) {
        return Err(Error::Config(format!("{env_name} must be a number > 0")));
    }
    Ok(parsed)
}

fn parse_positive_usize(raw: &str, env_name: &str) -> Result<usize, Error> {
    let parsed = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

pub fn validate_config(config: &AppConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();
    let s = &config.strategy;

    if !(s.risk_multiplier > 0.0 && s.risk_multiplier <= 1.0) {
        issues.push("strategy.risk_multiplier must be in (0, 1]".into());
    }
    if !(s.pass_threshold <= s.lean_threshold && s.lean_threshold <= s.smash_threshold) {
        issues.push("strategy thresholds must satisfy pass <= lean <= smash".into());
    }
    if !(s.edge_floor < 0.0 && s.edge_ceiling > 0.0) {
        issues.push("strategy.edge_floor must be < 0 and strategy.edge_ceiling > 0".into());
    }
    if s.max_props_per_scan == 0 {
        issues.push("strategy.max_props_per_scan must be > 0".into());
    }

    let c = &config.cache;
    for (name, ttl) in [
        ("cache.schedule_ttl_minutes", c.schedule_ttl_minutes),
        ("cache.props_ttl_minutes", c.props_ttl_minutes),
        ("cache.trends_ttl_minutes", c.trends_ttl_minutes),
        ("cache.analysis_ttl_minutes", c.analysis_ttl_minutes),
    ] {
        if ttl <= 0 || ttl > MAX_TTL_MINUTES {
            issues.push(format!("{name} must be in (0, {MAX_TTL_MINUTES}]"));
        }
    }

    if config.workers.max_workers == 0 {
        issues.push("workers.max_workers must be > 0".into());
    }

    if config.odds.timeout_secs == 0 {
        issues.push("odds.timeout_secs must be > 0".into());
    }
    if config.llm.research_timeout_secs == 0 {
        issues.push("llm.research_timeout_secs must be > 0".into());
    }
    if config.llm.analysis_timeout_secs == 0 {
        issues.push("llm.analysis_timeout_secs must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply environment overrides using `lookup` as the variable source.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), Error> {
    if let Some(key) = lookup("ODDS_API_KEY") {
        config.odds_api_key = key;
    }
    if let Some(key) = lookup("OPENROUTER_API_KEY") {
        config.openrouter_api_key = key;
    }
    if let Some(raw) = lookup("PROP_GEM_RISK_MULTIPLIER") {
        config.strategy.risk_multiplier = parse_positive_f64(&raw, "PROP_GEM_RISK_MULTIPLIER")?;
    }
    if let Some(raw) = lookup("PROP_GEM_MAX_WORKERS") {
        config.workers.max_workers = parse_positive_usize(&raw, "PROP_GEM_MAX_WORKERS")?;
    }
    if let Some(dir) = lookup("PROP_GEM_CACHE_DIR") {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            config.cache.dir = trimmed.to_string();
        }
    }
    Ok(())
}

/// Load configuration from environment and an optional config file.
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = AppConfig::default();

    // 3. config.toml, or the explicit path. An explicit path must exist.
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    } else if config_path.is_some() {
        return Err(Error::Config(format!("Config file not found: {}", path.display())));
    }

    // 4. Environment variables take priority.
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}
