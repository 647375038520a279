use common::config::StrategyConfig;
use common::StakeRecommendation;

/// Fractional Kelly stake for a decimal-odds bet.
///
/// `b = price - 1`, `full = (b·p - (1-p)) / b`, result `max(0, full · mult)`.
/// Degenerate inputs return 0 instead of failing.
pub fn kelly_stake(win_probability: f64, market_price: f64, risk_multiplier: f64) -> f64 {
    if !win_probability.is_finite() || !market_price.is_finite() || !risk_multiplier.is_finite() {
        return 0.0;
    }

    let b = market_price - 1.0;
    if b <= 0.0 {
        return 0.0;
    }

    let p = win_probability.clamp(0.0, 1.0);
    let mult = risk_multiplier.clamp(0.0, 1.0);
    let full_kelly = (b * p - (1.0 - p)) / b;

    (full_kelly * mult).max(0.0)
}

#[derive(Debug, Clone, Copy)]
pub struct StakeCalculator {
    risk_multiplier: f64,
}

impl StakeCalculator {
    pub fn new(cfg: &StrategyConfig) -> Self {
        Self {
            risk_multiplier: cfg.risk_multiplier,
        }
    }

    pub fn kelly_stake(&self, win_probability: f64, market_price: f64) -> f64 {
        kelly_stake(win_probability, market_price, self.risk_multiplier)
    }

    pub fn recommend(&self, win_probability: f64, market_price: f64) -> StakeRecommendation {
        StakeRecommendation {
            kelly_fraction: self.kelly_stake(win_probability, market_price),
        }
    }
}

impl Default for StakeCalculator {
    fn default() -> Self {
        Self::new(&StrategyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_kelly_scenario() {
        // b = 0.91, full = (0.91 * 0.65 - 0.35) / 0.91 = 0.26538
        let stake = kelly_stake(0.65, 1.91, 0.25);
        let expected = (0.91 * 0.65 - 0.35) / 0.91 * 0.25;
        assert!((stake - expected).abs() < 1e-12);
        assert!((stake - 0.0663).abs() < 1e-4, "stake={}", stake);
    }

    #[test]
    fn test_zero_when_price_at_or_below_even() {
        for price in [1.0, 0.99, 0.0, -2.0] {
            for p in [0.0, 0.3, 0.9, 1.0] {
                assert_eq!(kelly_stake(p, price, 0.25), 0.0);
            }
        }
    }

    #[test]
    fn test_zero_when_no_edge() {
        // Implied 0.5 at 2.0; anything at or below is not a bet.
        assert_eq!(kelly_stake(0.5, 2.0, 0.25), 0.0);
        assert_eq!(kelly_stake(0.4, 2.0, 0.25), 0.0);
        assert_eq!(kelly_stake(0.0, 3.0, 1.0), 0.0);
    }

    #[test]
    fn test_never_exceeds_full_kelly() {
        let full = kelly_stake(0.7, 2.2, 1.0);
        assert!(kelly_stake(0.7, 2.2, 5.0) <= full);
        assert!(kelly_stake(0.7, 2.2, 0.25) < full);
    }

    #[test]
    fn test_invalid_inputs_are_safe() {
        assert_eq!(kelly_stake(f64::NAN, 1.91, 0.25), 0.0);
        assert_eq!(kelly_stake(0.6, f64::INFINITY, 0.25), 0.0);
        assert_eq!(kelly_stake(0.6, 1.91, -1.0), 0.0);
        assert!(kelly_stake(1.7, 1.91, 0.25) <= 0.25);
    }

    #[test]
    fn test_calculator_uses_configured_multiplier() {
        let calc = StakeCalculator::default();
        let rec = calc.recommend(0.65, 1.91);
        assert!((rec.kelly_fraction - kelly_stake(0.65, 1.91, 0.25)).abs() < 1e-12);

        let half = StakeCalculator::new(&StrategyConfig {
            risk_multiplier: 0.5,
            ..StrategyConfig::default()
        });
        assert!((half.kelly_stake(0.65, 1.91) - 2.0 * rec.kelly_fraction).abs() < 1e-12);
    }
}
