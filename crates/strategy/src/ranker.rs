//! Result ordering and display filters.

use std::fmt;

use common::{Rating, ScoredProp};

/// The two orderings the presentation layer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMode {
    /// SMASH, LEAN, PASS, FADE. Ties keep input order. Interactive view.
    RatingPriority,
    /// Raw edge, largest first. Ties keep input order. Batch report.
    EdgeDescending,
}

impl fmt::Display for RankMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RatingPriority => f.write_str("rating-priority"),
            Self::EdgeDescending => f.write_str("edge-descending"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RankSummary {
    pub total: usize,
    pub smash: usize,
    pub lean: usize,
}

pub struct ResultRanker;

impl ResultRanker {
    pub fn rank(mut results: Vec<ScoredProp>, mode: RankMode) -> Vec<ScoredProp> {
        match mode {
            RankMode::RatingPriority => results.sort_by_key(|r| r.edge.rating.priority()),
            RankMode::EdgeDescending => results.sort_by(|a, b| {
                b.edge.edge_percentage.total_cmp(&a.edge.edge_percentage)
            }),
        }
        results
    }

    /// SMASH plays only, in ranked order.
    pub fn highlights(ranked: &[ScoredProp]) -> Vec<&ScoredProp> {
        ranked.iter().filter(|r| r.edge.rating == Rating::Smash).collect()
    }

    /// Everything except PASS, in ranked order.
    pub fn report_view(ranked: &[ScoredProp]) -> Vec<&ScoredProp> {
        ranked.iter().filter(|r| r.edge.rating != Rating::Pass).collect()
    }

    /// Head of the ranked list, unless it is a PASS. Nothing lower down is
    /// promoted in its place.
    pub fn top_play(ranked: &[ScoredProp]) -> Option<&ScoredProp> {
        ranked.first().filter(|r| r.edge.rating != Rating::Pass)
    }

    pub fn summarize(results: &[ScoredProp]) -> RankSummary {
        RankSummary {
            total: results.len(),
            smash: results.iter().filter(|r| r.edge.rating == Rating::Smash).count(),
            lean: results.iter().filter(|r| r.edge.rating == Rating::Lean).count(),
        }
    }
}
