//! Terminal output and the saved report file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use common::config::{key_is_configured, AppConfig};
use common::{Game, Quote, ScoredProp, TrendEstimate};
use strategy::{LineShopper, PropRow, RankSummary};

const WIDE: usize = 130;
const NARROW: usize = 80;

pub fn banner(title: &str, width: usize) {
    println!("\n{}", "=".repeat(width));
    println!("{:=^width$}", format!(" {title} "), width = width);
    println!("{}", "=".repeat(width));
}

/// Missing keys are warnings, never errors: the affected client runs on
/// demo or simulated data.
pub fn config_warnings(cfg: &AppConfig) -> Vec<String> {
    let mut issues = Vec::new();
    if !key_is_configured(&cfg.odds_api_key) {
        issues.push("ODDS_API_KEY not set (demo odds)".to_string());
    }
    if !key_is_configured(&cfg.openrouter_api_key) {
        issues.push("OPENROUTER_API_KEY not set (simulated mode)".to_string());
    }
    issues
}

pub fn print_config_warnings(issues: &[String]) {
    if issues.is_empty() {
        return;
    }
    println!("\n{}", "!".repeat(NARROW));
    println!("{:!^width$}", " CONFIGURATION WARNINGS ", width = NARROW);
    println!("{}", "!".repeat(NARROW));
    for issue in issues {
        println!("  [!] {issue}");
    }
    println!("{}\n", "!".repeat(NARROW));
}

pub fn print_games(games: &[Game]) {
    banner("AVAILABLE GAMES", NARROW);
    for (i, game) in games.iter().enumerate() {
        println!("  [{}] {}", i + 1, game.matchup());
    }
    println!("{}", "=".repeat(NARROW));
}

/// "70% Imp [INJ]".
pub fn trend_summary(trends: &TrendEstimate) -> String {
    let direction: String = trends.trend_direction.to_string().chars().take(3).collect();
    let mut out = format!("{:.0}% {}", trends.last_10_hit_rate * 100.0, direction);
    if trends.has_injury_concern {
        out.push_str(" [INJ]");
    }
    out
}

/// "+12.0%".
pub fn signed_pct(fraction: f64) -> String {
    format!("{:+.1}%", fraction * 100.0)
}

/// Near-line alert for the batch table: a different book beating this
/// quote within half a point.
pub fn better_line_alert(all_quotes: &[Quote], prop: &ScoredProp) -> String {
    let q = &prop.quote;
    match LineShopper::find_near_line(all_quotes, &q.player, q.stat, q.side, q.line, q.price) {
        Some(better) if better.book != q.book => {
            format!("Better: {} {:.2}", better.book, better.price)
        }
        _ => String::new(),
    }
}

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Batch report table. `shown` is the ranked, PASS-free view.
pub fn print_report(
    shown: &[&ScoredProp],
    summary: &RankSummary,
    top: Option<&ScoredProp>,
    all_quotes: &[Quote],
) {
    banner("ANALYSIS RESULTS", WIDE);
    println!(
        "\n{:<22} {:<5} {:<6} {:<8} {:<6} {:<12} {:<7} {:<15} {:<20}",
        "PLAYER", "MKT", "LINE", "EDGE", "ODDS", "BOOK", "KELLY", "TRENDS (L10)", "ALERT"
    );
    println!("{}", "-".repeat(WIDE));

    for prop in shown {
        let q = &prop.quote;
        println!(
            "{:<22} {:<5} {:<6.1} {:<8} {:<6.2} {:<12} {:<6.1}% {:<15} {:<20}",
            clip(&q.player, 21),
            q.stat.code(),
            q.line,
            signed_pct(prop.edge.edge_percentage),
            q.price,
            clip(&q.book, 12),
            prop.stake.kelly_fraction * 100.0,
            trend_summary(&prop.trends),
            better_line_alert(all_quotes, prop),
        );
    }
    println!("{}", "-".repeat(WIDE));

    println!(
        "\nTOTAL: {} props | {} SMASH | {} LEAN",
        summary.total, summary.smash, summary.lean
    );
    if let Some(best) = top {
        let q = &best.quote;
        println!(
            "TOP PLAY: {} {} {} @ {:.2} ({} edge)",
            q.player,
            q.stat.code(),
            q.line,
            q.price,
            signed_pct(best.edge.edge_percentage)
        );
    }
    println!("{}", "=".repeat(WIDE));
}

/// Interactive results table.
pub fn print_rows(rows: &[PropRow]) {
    banner("ANALYSIS RESULTS", WIDE);
    println!(
        "\n{:<22} {:<4} {:<5} {:<6} {:<6} {:<12} {:<30} {:<7} {:<6} {:<7}",
        "PLAYER", "MKT", "SIDE", "LINE", "ODDS", "BOOK", "BETTER LINES", "EDGE", "RATING", "CONF"
    );
    println!("{}", "-".repeat(WIDE));
    for r in rows {
        println!(
            "{:<22} {:<4} {:<5} {:<6.1} {:<6.2} {:<12} {:<30} {:<7} {:<6} {:<7}",
            clip(&r.player, 21),
            r.market,
            r.side,
            r.line,
            r.price,
            clip(&r.book, 12),
            clip(&r.better_lines, 30),
            r.edge_pct,
            r.rating,
            r.confidence,
        );
        println!("    {}", r.reasoning);
    }
    println!("{}", "-".repeat(WIDE));
}

/// One highlight line per SMASH play.
pub fn highlight_line(row: &PropRow) -> String {
    let prefix = if row.side == "Over" { "O" } else { "U" };
    let better = if row.better_lines != strategy::line_shop::NO_BETTER_PRICE {
        format!(" | Better: {}", row.better_lines)
    } else {
        String::new()
    };
    format!(
        "{} - {}{} {} @ {:.2} | Edge: {} | {} Confidence | {}{}",
        row.player,
        prefix,
        row.line,
        row.market,
        row.price,
        row.edge_pct,
        row.confidence,
        row.book,
        better
    )
}

pub fn print_highlights(rows: &[PropRow]) {
    if rows.is_empty() {
        println!("\nNo SMASH plays found.");
        return;
    }
    println!("\nSMASH PLAYS");
    for row in rows {
        println!("  * {}", highlight_line(row));
    }
}

/// Only `[A-Za-z0-9_-]` from the event id reaches the file name.
pub fn report_file_name(game_id: &str) -> String {
    let short: String = game_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(8)
        .collect();
    format!("props_{short}.txt")
}

pub fn report_line(prop: &ScoredProp) -> String {
    let q = &prop.quote;
    format!(
        "{} {} {} @ {:.2} [{}] | Edge: {} | {}",
        q.player,
        q.stat.code(),
        q.line,
        q.price,
        q.book,
        signed_pct(prop.edge.edge_percentage),
        prop.edge.rating
    )
}

/// Write the non-PASS results to `props_{id}.txt` under `dir`.
pub fn save_report(dir: &Path, game: &Game, shown: &[&ScoredProp]) -> io::Result<PathBuf> {
    let path = dir.join(report_file_name(&game.id));
    let mut out = String::new();
    out.push_str("PROP GEM AI - Analysis Results\n");
    out.push_str(&format!("Game: {}\n", game.matchup()));
    out.push_str(&"=".repeat(NARROW));
    out.push_str("\n\n");
    for prop in shown {
        out.push_str(&report_line(prop));
        out.push('\n');
    }
    fs::write(&path, out)?;
    Ok(path)
}
