use std::sync::Arc;
use std::time::Duration;

use common::config::{key_is_configured, OddsConfig};
use common::{Error, Game, Quote, Result};
use strategy::{CacheNamespace, FreshnessCache};
use tracing::{debug, info, instrument, warn};

use crate::demo::{demo_props, demo_schedule};
use crate::envelope::{flatten_event, OddsEnvelope};

/// The Odds API client.
///
/// Public calls never fail: any transport or decode problem is logged and
/// answered with demo data. Only live results are cached.
#[derive(Debug, Clone)]
pub struct OddsClient {
    http: reqwest::Client,
    cfg: OddsConfig,
    api_key: String,
    schedule_cache: Arc<FreshnessCache>,
    props_cache: Arc<FreshnessCache>,
}

impl OddsClient {
    pub fn new(
        cfg: &OddsConfig,
        api_key: &str,
        schedule_cache: Arc<FreshnessCache>,
        props_cache: Arc<FreshnessCache>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("prop-gem/0.1")
            .pool_max_idle_per_host(4)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| Error::Http(format!("failed to build odds HTTP client: {e}")))?;

        Ok(Self {
            http,
            cfg: cfg.clone(),
            api_key: api_key.trim().to_string(),
            schedule_cache,
            props_cache,
        })
    }

    /// False when running on demo data only.
    pub fn is_live(&self) -> bool {
        key_is_configured(&self.api_key)
    }

    /// Upcoming games. Never empty unless the provider returns an empty
    /// list.
    #[instrument(skip(self))]
    pub async fn get_schedule(&self) -> Vec<Game> {
        let key = CacheNamespace::Schedule.key("");
        if let Some(games) = self.schedule_cache.get::<Vec<Game>>(&key) {
            if !games.is_empty() {
                debug!("schedule served from cache ({} games)", games.len());
                return games;
            }
        }

        if !self.is_live() {
            info!("odds API key not configured, using demo schedule");
            return demo_schedule();
        }

        match self.fetch_schedule().await {
            Ok(games) => {
                if let Err(e) = self.schedule_cache.put(&key, &games) {
                    warn!("failed to cache schedule: {}", e);
                }
                info!("fetched {} games", games.len());
                games
            }
            Err(e) => {
                warn!("schedule fetch failed, using demo schedule: {}", e);
                demo_schedule()
            }
        }
    }

    /// Every prop quote for one event across all books and regions.
    #[instrument(skip(self))]
    pub async fn get_props_for_game(&self, event_id: &str) -> Vec<Quote> {
        let key = CacheNamespace::Props.key(event_id);
        if let Some(quotes) = self.props_cache.get::<Vec<Quote>>(&key) {
            if !quotes.is_empty() {
                debug!("props for {} served from cache ({} quotes)", event_id, quotes.len());
                return quotes;
            }
        }

        if !self.is_live() || event_id.starts_with("demo") {
            info!("using demo props for {}", event_id);
            return demo_props(event_id);
        }

        match self.fetch_props(event_id).await {
            Ok(quotes) if quotes.is_empty() => {
                warn!("no props returned for {}, using demo props", event_id);
                demo_props(event_id)
            }
            Ok(quotes) => {
                if let Err(e) = self.props_cache.put(&key, &quotes) {
                    warn!("failed to cache props for {}: {}", event_id, e);
                }
                info!("fetched {} quotes for {}", quotes.len(), event_id);
                quotes
            }
            Err(e) => {
                warn!("props fetch for {} failed, using demo props: {}", event_id, e);
                demo_props(event_id)
            }
        }
    }

    async fn fetch_schedule(&self) -> Result<Vec<Game>> {
        let url = format!("{}/{}/events", self.base_url(), self.cfg.sport_key);
        let events = self
            .get_envelope(&url)
            .await?
            .into_events()
            .map_err(Error::OddsApi)?;
        Ok(events.iter().map(|e| e.to_game()).collect())
    }

    async fn fetch_props(&self, event_id: &str) -> Result<Vec<Quote>> {
        let url = format!("{}/{}/events/{}/odds", self.base_url(), self.cfg.sport_key, event_id);
        let event = match self.get_envelope(&url).await? {
            OddsEnvelope::Single(event) => event,
            OddsEnvelope::Events(events) => match events.into_iter().next() {
                Some(event) => event,
                None => return Ok(Vec::new()),
            },
            OddsEnvelope::Error(msg) => return Err(Error::OddsApi(msg)),
        };
        Ok(flatten_event(&event))
    }

    async fn get_envelope(&self, url: &str) -> Result<OddsEnvelope> {
        let query = [
            ("apiKey", self.api_key.as_str()),
            ("regions", self.cfg.regions.as_str()),
            ("markets", self.cfg.markets.as_str()),
            ("oddsFormat", self.cfg.odds_format.as_str()),
        ];

        debug!("GET {}", url);
        let resp = self.http.get(url).query(&query).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Http(format!("odds request failed: {e}"))
            }
        })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("odds body read failed: {e}")))?;

        if !status.is_success() {
            return Err(Error::OddsApi(format!(
                "status={} body={}",
                status.as_u16(),
                body.chars().take(500).collect::<String>()
            )));
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        OddsEnvelope::decode(value)
    }

    fn base_url(&self) -> &str {
        self.cfg.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BetSide, StatKind};

    fn caches() -> (Arc<FreshnessCache>, Arc<FreshnessCache>) {
        (
            Arc::new(FreshnessCache::in_memory(CacheNamespace::Schedule, 360)),
            Arc::new(FreshnessCache::in_memory(CacheNamespace::Props, 15)),
        )
    }

    fn unreachable_config() -> OddsConfig {
        OddsConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..OddsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_demo_mode_without_key() {
        let (s, p) = caches();
        let client = OddsClient::new(&OddsConfig::default(), "PLACEHOLDER", s, p.clone()).unwrap();
        assert!(!client.is_live());

        let games = client.get_schedule().await;
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "demo1");

        let props = client.get_props_for_game("demo1").await;
        assert_eq!(props.len(), 4);
        // Demo data is never cached.
        assert!(p.is_empty());
    }

    #[tokio::test]
    async fn test_cached_schedule_wins() {
        let (s, p) = caches();
        let cached = vec![Game {
            id: "evt9".into(),
            home_team: "Denver Nuggets".into(),
            away_team: "Utah Jazz".into(),
            commence_time: String::new(),
        }];
        s.put("schedule", &cached).unwrap();

        let client = OddsClient::new(&unreachable_config(), "", s, p).unwrap();
        assert_eq!(client.get_schedule().await, cached);
    }

    #[tokio::test]
    async fn test_cached_props_win() {
        let (s, p) = caches();
        let quote = Quote {
            player: "Nikola Jokic".into(),
            stat: StatKind::Assists,
            side: BetSide::Over,
            line: 9.5,
            price: 1.87,
            book: "FanDuel".into(),
            book_key: "fanduel".into(),
            event_id: "evt9".into(),
            matchup: "Utah Jazz @ Denver Nuggets".into(),
            commence_time: String::new(),
        };
        p.put("props_evt9", &vec![quote.clone()]).unwrap();

        let client = OddsClient::new(&unreachable_config(), "live-key", s, p).unwrap();
        assert_eq!(client.get_props_for_game("evt9").await, vec![quote]);
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_demo() {
        let (s, p) = caches();
        let client =
            OddsClient::new(&unreachable_config(), "live-key", s.clone(), p.clone()).unwrap();
        assert!(client.is_live());

        let games = client.get_schedule().await;
        assert_eq!(games[0].id, "demo1");

        let props = client.get_props_for_game("abc123").await;
        assert_eq!(props.len(), 4);
        assert!(props.iter().all(|q| q.event_id == "abc123"));

        assert!(s.is_empty() && p.is_empty());
    }
}
