//! Odds format conversion.

use common::{Error, Result};

/// +150 → 2.50, -110 → 1.909.
pub fn american_to_decimal(american: f64) -> f64 {
    if american > 0.0 {
        american / 100.0 + 1.0
    } else {
        100.0 / american.abs() + 1.0
    }
}

/// 2.50 → +150, 1.91 → -109. Truncates toward zero.
pub fn decimal_to_american(decimal: f64) -> i64 {
    if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0) as i64
    } else {
        (-100.0 / (decimal - 1.0)) as i64
    }
}

/// Accept either format from the command line. Magnitudes of 100 or more
/// are American; everything else must already be decimal odds above 1.
pub fn parse_odds_input(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::Other(format!("invalid odds: {raw}")))?;

    if !value.is_finite() {
        return Err(Error::Other(format!("invalid odds: {raw}")));
    }
    if value.abs() >= 100.0 {
        return Ok(american_to_decimal(value));
    }
    if value > 1.0 {
        return Ok(value);
    }
    Err(Error::Other(format!(
        "odds must be decimal above 1.0 or American with |odds| >= 100, got {raw}"
    )))
}
