//! Provider response shapes.
//!
//! The events endpoint answers with a bare list, a wrapper object, a single
//! event, or an error object depending on plan and failure mode. Responses
//! are decoded into `OddsEnvelope` once at the boundary.

use common::{BetSide, Game, Quote, Result, StatKind};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OddsEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub commence_time: String,
    #[serde(default)]
    pub bookmakers: Vec<OddsBookmaker>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OddsBookmaker {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<OddsMarket>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OddsMarket {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OddsOutcome {
    #[serde(default)]
    pub name: String,
    /// Player name on prop markets.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}

impl OddsEvent {
    pub fn to_game(&self) -> Game {
        Game {
            id: self.id.clone(),
            home_team: or_tbd(&self.home_team),
            away_team: or_tbd(&self.away_team),
            commence_time: self.commence_time.clone(),
        }
    }

    pub fn matchup(&self) -> String {
        format!("{} @ {}", or_tbd(&self.away_team), or_tbd(&self.home_team))
    }
}

fn or_tbd(team: &str) -> String {
    if team.is_empty() {
        "TBD".to_string()
    } else {
        team.to_string()
    }
}

#[derive(Debug, Clone)]
pub enum OddsEnvelope {
    Events(Vec<OddsEvent>),
    Error(String),
    Single(OddsEvent),
}

impl OddsEnvelope {
    pub fn decode(value: Value) -> Result<Self> {
        match value {
            Value::Array(_) => Ok(Self::Events(serde_json::from_value(value)?)),
            Value::Object(mut map) => {
                for key in ["message", "error"] {
                    if let Some(msg) = map.get(key) {
                        let text = msg
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| msg.to_string());
                        return Ok(Self::Error(text));
                    }
                }
                for key in ["data", "events"] {
                    if let Some(inner @ Value::Array(_)) = map.remove(key) {
                        return Ok(Self::Events(serde_json::from_value(inner)?));
                    }
                }
                if map.contains_key("bookmakers") || map.contains_key("id") {
                    return Ok(Self::Single(serde_json::from_value(Value::Object(map))?));
                }
                Ok(Self::Error("unrecognised response object".to_string()))
            }
            other => Ok(Self::Error(format!("unexpected response type: {}", json_type(&other)))),
        }
    }

    /// Collapse to an event list. Single events become a one-element list.
    pub fn into_events(self) -> std::result::Result<Vec<OddsEvent>, String> {
        match self {
            Self::Events(events) => Ok(events),
            Self::Single(event) => Ok(vec![event]),
            Self::Error(msg) => Err(msg),
        }
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One `Quote` per bookmaker × market × outcome. Markets outside the
/// three modeled stats are dropped.
pub fn flatten_event(event: &OddsEvent) -> Vec<Quote> {
    let matchup = event.matchup();
    let mut quotes = Vec::new();

    for book in &event.bookmakers {
        let book_name = if book.title.is_empty() { "Unknown" } else { book.title.as_str() };

        for market in &book.markets {
            let Some(stat) = StatKind::from_market_key(&market.key) else {
                continue;
            };

            for outcome in &market.outcomes {
                let player = outcome
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| outcome.name.clone());

                quotes.push(Quote {
                    player,
                    stat,
                    side: BetSide::from_outcome_name(&outcome.name),
                    line: outcome.point.unwrap_or(0.0),
                    price: outcome.price,
                    book: book_name.to_string(),
                    book_key: book.key.clone(),
                    event_id: event.id.clone(),
                    matchup: matchup.clone(),
                    commence_time: event.commence_time.clone(),
                });
            }
        }
    }

    quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_json() -> Value {
        json!({
            "id": "abc123",
            "home_team": "Boston Celtics",
            "away_team": "Los Angeles Lakers",
            "commence_time": "2026-01-10T00:30:00Z",
            "bookmakers": [
                {
                    "key": "draftkings",
                    "title": "DraftKings",
                    "markets": [
                        {
                            "key": "player_points",
                            "outcomes": [
                                {"name": "Over", "description": "LeBron James",
                                 "price": 1.91, "point": 28.5},
                                {"name": "Under", "description": "LeBron James",
                                 "price": 1.89, "point": 28.5}
                            ]
                        },
                        {
                            "key": "player_threes",
                            "outcomes": [
                                {"name": "Over", "description": "LeBron James",
                                 "price": 2.10, "point": 2.5}
                            ]
                        }
                    ]
                },
                {
                    "key": "bet365",
                    "title": "Bet365",
                    "markets": [
                        {
                            "key": "player_rebounds",
                            "outcomes": [
                                {"name": "Over", "price": 1.95, "point": 8.5}
                            ]
                        }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_decode_bare_list() {
        let env = OddsEnvelope::decode(json!([event_json()])).unwrap();
        assert!(matches!(env, OddsEnvelope::Events(ref v) if v.len() == 1));
    }

    #[test]
    fn test_decode_error_objects() {
        let env = OddsEnvelope::decode(json!({"message": "Usage quota has been reached"})).unwrap();
        assert!(matches!(env, OddsEnvelope::Error(ref m) if m.contains("quota")));

        let env = OddsEnvelope::decode(json!({"error": {"code": 401}})).unwrap();
        assert!(matches!(env, OddsEnvelope::Error(_)));
    }

    #[test]
    fn test_decode_wrappers_and_single() {
        let env = OddsEnvelope::decode(json!({"data": [event_json(), event_json()]})).unwrap();
        assert_eq!(env.into_events().unwrap().len(), 2);

        let env = OddsEnvelope::decode(json!({"events": []})).unwrap();
        assert!(env.into_events().unwrap().is_empty());

        let env = OddsEnvelope::decode(event_json()).unwrap();
        assert!(matches!(env, OddsEnvelope::Single(ref e) if e.id == "abc123"));
    }

    #[test]
    fn test_decode_unexpected_shapes() {
        assert!(OddsEnvelope::decode(json!("nope")).unwrap().into_events().is_err());
        assert!(OddsEnvelope::decode(json!({"foo": 1})).unwrap().into_events().is_err());
    }

    #[test]
    fn test_flatten_event() {
        let event: OddsEvent = serde_json::from_value(event_json()).unwrap();
        let quotes = flatten_event(&event);

        // player_threes dropped.
        assert_eq!(quotes.len(), 3);

        let over = &quotes[0];
        assert_eq!(over.player, "LeBron James");
        assert_eq!(over.stat, StatKind::Points);
        assert_eq!(over.side, BetSide::Over);
        assert_eq!(over.line, 28.5);
        assert_eq!(over.book, "DraftKings");
        assert_eq!(over.matchup, "Los Angeles Lakers @ Boston Celtics");
        assert_eq!(quotes[1].side, BetSide::Under);

        // No description: the outcome name stands in for the player.
        assert_eq!(quotes[2].player, "Over");
        assert_eq!(quotes[2].stat, StatKind::Rebounds);
        assert_eq!(quotes[2].book_key, "bet365");
    }
}
