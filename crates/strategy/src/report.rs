//! Flat display records.

use common::ScoredProp;
use serde::Serialize;

use crate::line_shop::LineShopper;

/// One table row, every field already formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropRow {
    pub player: String,
    pub market: String,
    pub side: String,
    pub line: f64,
    pub price: f64,
    pub book: String,
    pub better_lines: String,
    pub edge_pct: String,
    pub rating: String,
    pub confidence: String,
    pub reasoning: String,
    pub kelly_pct: String,
}

impl PropRow {
    pub fn from_scored(prop: &ScoredProp, max_alternatives: usize, reasoning_chars: usize) -> Self {
        let shown = &prop.alternatives[..prop.alternatives.len().min(max_alternatives)];

        Self {
            player: prop.quote.player.clone(),
            market: prop.quote.stat.code().to_string(),
            side: prop.quote.side.label().to_string(),
            line: prop.quote.line,
            price: prop.quote.price,
            book: prop.quote.book.clone(),
            better_lines: LineShopper::summarize(shown),
            edge_pct: format_pct(prop.edge.edge_percentage),
            rating: prop.edge.rating.label().to_string(),
            confidence: prop.edge.confidence.to_string(),
            reasoning: truncate_reasoning(&prop.edge.reasoning, reasoning_chars),
            kelly_pct: format_pct(prop.stake.kelly_fraction),
        }
    }
}

/// 0.12 → "12.0%".
pub fn format_pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Cut to `max_chars` characters and append "..." when longer.
pub fn truncate_reasoning(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
