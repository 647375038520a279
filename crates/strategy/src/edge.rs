//! Edge scoring.
//!
//! Merges an estimated win probability (or an estimator's edge) with the
//! market-implied probability into a bounded edge and a rating. The rating
//! table here is the only source of truth; upstream labels are advisory.

use common::config::StrategyConfig;
use common::{AnalysisEstimate, Confidence, EdgeResult, EstimatorOutcome, Rating};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

pub const DEFAULT_REASONING: &str = "No reasoning";
pub const SIMULATED_REASONING: &str = "Simulated analysis";

/// Edges the simulated fallback picks from.
const SIMULATED_EDGES: [f64; 7] = [0.12, 0.08, 0.05, 0.02, 0.01, -0.02, -0.05];

/// Threshold table, evaluated top-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingPolicy {
    pub smash: f64,
    pub lean: f64,
    pub pass: f64,
}

impl RatingPolicy {
    pub fn rate(&self, edge: f64) -> Rating {
        if edge >= self.smash {
            Rating::Smash
        } else if edge >= self.lean {
            Rating::Lean
        } else if edge >= self.pass {
            Rating::Pass
        } else {
            Rating::Fade
        }
    }
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            smash: 0.10,
            lean: 0.03,
            pass: 0.00,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeScorer {
    policy: RatingPolicy,
    floor: f64,
    ceiling: f64,
}

impl EdgeScorer {
    pub fn new(cfg: &StrategyConfig) -> Self {
        Self {
            policy: RatingPolicy {
                smash: cfg.smash_threshold,
                lean: cfg.lean_threshold,
                pass: cfg.pass_threshold,
            },
            floor: cfg.edge_floor,
            ceiling: cfg.edge_ceiling,
        }
    }

    /// `1 / price`. Prices at or below zero, or non-finite, imply certainty.
    pub fn implied_probability(market_price: f64) -> f64 {
        if !market_price.is_finite() || market_price <= 0.0 {
            return 1.0;
        }
        1.0 / market_price
    }

    /// Values above 1 are assumed to be percentages (12 → 0.12).
    pub fn normalize_scale(value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        if value > 1.0 {
            value / 100.0
        } else {
            value
        }
    }

    pub fn clamp_edge(&self, edge: f64) -> f64 {
        if edge.is_nan() {
            return 0.0;
        }
        edge.clamp(self.floor, self.ceiling)
    }

    /// Score a win-probability estimate against a market price.
    pub fn score(&self, market_price: f64, estimated_win_probability: f64) -> EdgeResult {
        let p = Self::normalize_scale(estimated_win_probability);
        let raw_edge = p - Self::implied_probability(market_price);
        let edge = self.clamp_edge(raw_edge);

        EdgeResult {
            edge_percentage: edge,
            rating: self.policy.rate(edge),
            confidence: Confidence::default(),
            reasoning: DEFAULT_REASONING.to_string(),
            simulated: false,
        }
    }

    /// Score an estimator response that already carries an edge.
    ///
    /// Scale normalization runs before clamping. The supplied rating label
    /// never decides the rating.
    pub fn score_estimate(&self, estimate: &AnalysisEstimate) -> EdgeResult {
        let edge = self.clamp_edge(Self::normalize_scale(estimate.edge_percentage));
        let rating = self.policy.rate(edge);

        match estimate.rating.as_deref().map(|l| (l, Rating::from_label(l))) {
            Some((label, None)) => debug!("discarding unknown rating label {:?}", label),
            Some((label, Some(r))) if r != rating => {
                debug!("estimator rated {} but edge {:.4} rates {}", label, edge, rating)
            }
            _ => {}
        }

        EdgeResult {
            edge_percentage: edge,
            rating,
            confidence: estimate
                .confidence
                .as_deref()
                .map(Confidence::from_label)
                .unwrap_or_default(),
            reasoning: estimate
                .reasoning
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REASONING.to_string()),
            simulated: false,
        }
    }

    /// Turn any estimator outcome into a result. Failures fall back to the
    /// simulated placeholder for `seed`.
    pub fn resolve(&self, outcome: EstimatorOutcome<AnalysisEstimate>, seed: &str) -> EdgeResult {
        match outcome {
            EstimatorOutcome::Success(estimate) => self.score_estimate(&estimate),
            EstimatorOutcome::ParseFailure(reason) => {
                warn!("analysis for {} unparsable ({}), using simulated result", seed, reason);
                self.simulated(seed)
            }
            EstimatorOutcome::TransportFailure(reason) => {
                warn!("analysis for {} unavailable ({}), using simulated result", seed, reason);
                self.simulated(seed)
            }
        }
    }

    /// Deterministic placeholder, flagged `simulated`.
    pub fn simulated(&self, seed: &str) -> EdgeResult {
        let digest = Sha256::digest(seed.as_bytes());
        let edge = SIMULATED_EDGES[digest[0] as usize % SIMULATED_EDGES.len()];
        let edge = self.clamp_edge(edge);
        let rating = self.policy.rate(edge);
        let confidence = match rating {
            Rating::Smash | Rating::Fade => Confidence::High,
            Rating::Lean => Confidence::Medium,
            Rating::Pass => Confidence::Low,
        };

        EdgeResult {
            edge_percentage: edge,
            rating,
            confidence,
            reasoning: SIMULATED_REASONING.to_string(),
            simulated: true,
        }
    }

    /// Win probability implied by the market plus the estimated edge.
    pub fn true_win_probability(market_price: f64, edge: f64) -> f64 {
        (Self::implied_probability(market_price) + edge).clamp(0.0, 1.0)
    }
}

impl Default for EdgeScorer {
    fn default() -> Self {
        Self::new(&StrategyConfig::default())
    }
}
