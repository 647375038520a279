//! Domain types shared across the workspace.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

// ── Markets ───────────────────────────────────────────────────────────

/// The three player-prop stats offered by the odds provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    #[serde(rename = "PTS")]
    Points,
    #[serde(rename = "REB")]
    Rebounds,
    #[serde(rename = "AST")]
    Assists,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Points, StatKind::Rebounds, StatKind::Assists];

    /// Display code shown in tables ("PTS").
    pub fn code(&self) -> &'static str {
        match self {
            Self::Points => "PTS",
            Self::Rebounds => "REB",
            Self::Assists => "AST",
        }
    }

    /// Provider market key ("player_points").
    pub fn market_key(&self) -> &'static str {
        match self {
            Self::Points => "player_points",
            Self::Rebounds => "player_rebounds",
            Self::Assists => "player_assists",
        }
    }

    pub fn from_market_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.market_key() == key)
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pts" | "points" | "player_points" => Ok(Self::Points),
            "reb" | "rebounds" | "player_rebounds" => Ok(Self::Rebounds),
            "ast" | "assists" | "player_assists" => Ok(Self::Assists),
            other => Err(Error::Other(format!("unknown stat: {other}"))),
        }
    }
}

/// Over or Under the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetSide {
    Over,
    Under,
}

impl BetSide {
    /// Provider outcome names are "Over"/"Under"; anything not mentioning
    /// "over" is treated as the under side.
    pub fn from_outcome_name(name: &str) -> Self {
        if name.to_ascii_lowercase().contains("over") {
            Self::Over
        } else {
            Self::Under
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Over => "Over",
            Self::Under => "Under",
        }
    }

    /// Single-letter prefix used in compact displays ("O28.5").
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Over => "O",
            Self::Under => "U",
        }
    }
}

impl fmt::Display for BetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BetSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "over" | "o" => Ok(Self::Over),
            "under" | "u" => Ok(Self::Under),
            other => Err(Error::Other(format!("unknown side: {other}"))),
        }
    }
}

// ── Quotes ────────────────────────────────────────────────────────────

/// One price offer from one sportsbook. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub player: String,
    pub stat: StatKind,
    pub side: BetSide,
    pub line: f64,
    /// Decimal odds (a 1-unit stake returns `price` on a win).
    pub price: f64,
    pub book: String,
    #[serde(default)]
    pub book_key: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub matchup: String,
    #[serde(default)]
    pub commence_time: String,
}

impl Quote {
    pub fn outcome_key(&self) -> OutcomeKey {
        OutcomeKey::new(&self.player, self.stat, self.side, self.line)
    }
}

/// Identifies "the same bet" across books. Exact match on all four fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeKey {
    pub player: String,
    pub stat: StatKind,
    pub side: BetSide,
    pub line: f64,
}

impl OutcomeKey {
    pub fn new(player: &str, stat: StatKind, side: BetSide, line: f64) -> Self {
        Self {
            player: player.to_string(),
            stat,
            side,
            line,
        }
    }

    // -0.0 and 0.0 compare equal as floats; fold them before hashing.
    fn line_bits(&self) -> u64 {
        if self.line == 0.0 {
            0.0f64.to_bits()
        } else {
            self.line.to_bits()
        }
    }
}

impl PartialEq for OutcomeKey {
    fn eq(&self, other: &Self) -> bool {
        self.player == other.player
            && self.stat == other.stat
            && self.side == other.side
            && self.line_bits() == other.line_bits()
    }
}

impl Eq for OutcomeKey {}

impl Hash for OutcomeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.player.hash(state);
        self.stat.hash(state);
        self.side.hash(state);
        self.line_bits().hash(state);
    }
}

impl fmt::Display for OutcomeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.player, self.stat, self.side, self.line)
    }
}

/// A (book, price) pair for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookPrice {
    pub book: String,
    pub price: f64,
}

/// A scheduled game as listed by the odds provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub commence_time: String,
}

impl Game {
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

// ── Research ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
    Unknown,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Improving => "Improving",
            Self::Stable => "Stable",
            Self::Declining => "Declining",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Research output for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEstimate {
    /// Fraction of the last 10 games that cleared the line, in [0, 1].
    pub last_10_hit_rate: f64,
    pub trend_direction: TrendDirection,
    pub has_injury_concern: bool,
    /// Advisory only; at most 300 characters.
    pub raw_notes: String,
    #[serde(default)]
    pub simulated: bool,
}

impl TrendEstimate {
    pub const MAX_NOTES_CHARS: usize = 300;

    /// Neutral estimate used when research text has no recognisable data.
    pub fn neutral() -> Self {
        Self {
            last_10_hit_rate: 0.5,
            trend_direction: TrendDirection::Stable,
            has_injury_concern: false,
            raw_notes: String::new(),
            simulated: false,
        }
    }
}

// ── Scoring ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rating {
    Smash,
    Lean,
    Pass,
    Fade,
}

impl Rating {
    /// Sort priority, best first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Smash => 0,
            Self::Lean => 1,
            Self::Pass => 2,
            Self::Fade => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Smash => "SMASH",
            Self::Lean => "LEAN",
            Self::Pass => "PASS",
            Self::Fade => "FADE",
        }
    }

    /// Exact-match parse of an upstream label. Anything else is rejected.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "SMASH" => Some(Self::Smash),
            "LEAN" => Some(Self::Lean),
            "PASS" => Some(Self::Pass),
            "FADE" => Some(Self::Fade),
            _ => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Lenient parse; unknown labels default to Medium.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Bounded edge plus its categorical rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeResult {
    /// Clamped to [-0.20, 0.30].
    pub edge_percentage: f64,
    pub rating: Rating,
    pub confidence: Confidence,
    pub reasoning: String,
    /// True when this result is a placeholder rather than a model estimate.
    #[serde(default)]
    pub simulated: bool,
}

/// Structured fields recovered from an analysis model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEstimate {
    /// Raw edge as returned; may be on the percent scale.
    pub edge_percentage: f64,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Result of asking an external estimator for something.
///
/// Clients decode raw provider text into this once; downstream code never
/// sees the raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorOutcome<T> {
    Success(T),
    ParseFailure(String),
    TransportFailure(String),
}

impl<T> EstimatorOutcome<T> {
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(v) => Some(v),
            _ => None,
        }
    }
}

/// Risk-adjusted stake as a fraction of bankroll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakeRecommendation {
    pub kelly_fraction: f64,
}

/// One fully processed prop, ready for ranking and display.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProp {
    /// The quote the user is shown (reference book and price).
    pub quote: Quote,
    /// Best price across all books; the price the edge was computed at.
    pub best_price: f64,
    /// Books strictly better than the reference, best first.
    pub alternatives: Vec<BookPrice>,
    pub trends: TrendEstimate,
    pub edge: EdgeResult,
    pub stake: StakeRecommendation,
}
