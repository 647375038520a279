//! Prop Gem: NBA player-prop edge finder.
//!
//! Single-binary Tokio application that:
//! 1. Pulls the schedule and player props from The Odds API (demo data when unkeyed)
//! 2. Shops every outcome across books for the best price
//! 3. Asks an LLM for recent trends and an edge estimate (simulated when unkeyed)
//! 4. Rates the edge and sizes a fractional-Kelly stake
//! 5. Prints a ranked report, optionally saved to disk

mod config;
mod display;
mod pipeline;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use common::config::AppConfig;
use common::{BetSide, Game, Quote, StatKind};
use odds_client::{parse_odds_input, OddsClient};
use pipeline::{run_batch, run_sequential, select_batch_props, select_interactive_props, Pipeline};
use strategy::{CacheNamespace, FreshnessCache, OddsQuoteStore, PropRow, RankMode, ResultRanker};

/// NBA player-prop edge finder
#[derive(Parser)]
#[command(name = "prop-gem", about = "NBA player-prop edge finder")]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one game's props concurrently and print the ranked report.
    Scan {
        /// 1-based game number from `games`; defaults to the first game.
        #[arg(long)]
        game: Option<usize>,
        /// Only consider quotes from this bookmaker.
        #[arg(long)]
        book: Option<String>,
        /// Write the report to props_<game>.txt in the working directory.
        #[arg(long)]
        save: bool,
    },
    /// Analyze props one at a time with progress, then show highlights.
    Interactive {
        #[arg(long)]
        game: Option<usize>,
        #[arg(long)]
        book: Option<String>,
    },
    /// Analyze a single prop entered by hand.
    Manual {
        #[arg(long)]
        player: String,
        /// PTS, REB or AST.
        #[arg(long)]
        stat: StatKind,
        #[arg(long)]
        line: f64,
        /// Decimal (1.91) or American (-110) odds.
        #[arg(long, allow_hyphen_values = true)]
        odds: String,
        #[arg(long, default_value = "over")]
        side: BetSide,
    },
    /// List today's games.
    Games,
}

const MANUAL_BOOK: &str = "Manual";

/// 1-based pick, first game when unspecified.
fn select_game(games: &[Game], pick: Option<usize>) -> anyhow::Result<&Game> {
    let idx = pick.unwrap_or(1);
    if idx == 0 || idx > games.len() {
        bail!("game {} out of range (1-{})", idx, games.len());
    }
    Ok(&games[idx - 1])
}

fn odds_client(cfg: &AppConfig) -> anyhow::Result<OddsClient> {
    let schedule_cache = Arc::new(FreshnessCache::open(
        &cfg.cache.dir,
        CacheNamespace::Schedule,
        cfg.cache.schedule_ttl_minutes,
    ));
    let props_cache = Arc::new(FreshnessCache::open(
        &cfg.cache.dir,
        CacheNamespace::Props,
        cfg.cache.props_ttl_minutes,
    ));
    OddsClient::new(&cfg.odds, &cfg.odds_api_key, schedule_cache, props_cache)
        .context("failed to build odds client")
}

/// Schedule then props for the chosen game. `None` when there is nothing
/// to analyze.
async fn load_game(
    odds: &OddsClient,
    pick: Option<usize>,
) -> anyhow::Result<Option<(Game, Vec<Quote>)>> {
    let games = odds.get_schedule().await;
    if games.is_empty() {
        println!("No games available.");
        return Ok(None);
    }
    let game = select_game(&games, pick)?.clone();
    info!("analyzing {}", game.matchup());

    let quotes = odds.get_props_for_game(&game.id).await;
    if quotes.is_empty() {
        println!("No props available for {}.", game.matchup());
        return Ok(None);
    }
    Ok(Some((game, quotes)))
}

async fn scan(
    cfg: &AppConfig,
    pipeline: Arc<Pipeline>,
    odds: &OddsClient,
    pick: Option<usize>,
    book: Option<&str>,
    save: bool,
) -> anyhow::Result<()> {
    let Some((game, quotes)) = load_game(odds, pick).await? else {
        return Ok(());
    };

    let props = select_batch_props(&quotes, book);
    if props.is_empty() {
        println!("No props match book filter {:?}.", book.unwrap_or_default());
        return Ok(());
    }
    info!("{} unique props selected", props.len());

    let store = Arc::new(OddsQuoteStore::build(quotes.clone()));
    let results = run_batch(pipeline, store, props, cfg.workers.max_workers).await;

    if results.is_empty() {
        println!("No results to display");
        return Ok(());
    }

    let mode = RankMode::EdgeDescending;
    info!("ranking {} results ({})", results.len(), mode);
    let ranked = ResultRanker::rank(results, mode);
    let shown = ResultRanker::report_view(&ranked);
    let summary = ResultRanker::summarize(&ranked);
    display::print_report(&shown, &summary, ResultRanker::top_play(&ranked), &quotes);

    if save {
        let path = display::save_report(std::path::Path::new("."), &game, &shown)
            .context("failed to write report")?;
        println!("Report saved to {}", path.display());
    }
    Ok(())
}

async fn interactive(
    cfg: &AppConfig,
    pipeline: &Pipeline,
    odds: &OddsClient,
    pick: Option<usize>,
    book: Option<&str>,
) -> anyhow::Result<()> {
    let Some((_game, quotes)) = load_game(odds, pick).await? else {
        return Ok(());
    };

    let store = OddsQuoteStore::build(quotes);
    info!(
        "{} outcomes across {} books",
        store.outcome_count(),
        store.books().len()
    );
    let props = select_interactive_props(&store, book, cfg.strategy.max_props_per_scan);
    if props.is_empty() {
        println!("No props match book filter {:?}.", book.unwrap_or_default());
        return Ok(());
    }

    println!("Analyzing {} props...", props.len());
    let results = run_sequential(pipeline, &store, &props, |done, total, scored| {
        println!(
            "  [{}/{}] {} {} {} -> {}",
            done,
            total,
            scored.quote.player,
            scored.quote.stat,
            scored.quote.line,
            scored.edge.rating
        );
    })
    .await;

    if results.is_empty() {
        println!("No results to display");
        return Ok(());
    }

    let mode = RankMode::RatingPriority;
    info!("ranking {} results ({})", results.len(), mode);
    let ranked = ResultRanker::rank(results, mode);
    let to_row = |p: &common::ScoredProp| {
        PropRow::from_scored(
            p,
            cfg.strategy.max_alternatives_shown,
            cfg.strategy.reasoning_display_chars,
        )
    };
    let rows: Vec<PropRow> = ranked.iter().map(to_row).collect();
    display::print_rows(&rows);

    let highlights: Vec<PropRow> = ResultRanker::highlights(&ranked)
        .into_iter()
        .map(to_row)
        .collect();
    display::print_highlights(&highlights);
    Ok(())
}

async fn manual(
    pipeline: &Pipeline,
    player: String,
    stat: StatKind,
    line: f64,
    raw_odds: &str,
    side: BetSide,
) -> anyhow::Result<()> {
    let price = parse_odds_input(raw_odds).context("invalid --odds")?;
    let quote = Quote {
        player,
        stat,
        side,
        line,
        price,
        book: MANUAL_BOOK.to_string(),
        book_key: MANUAL_BOOK.to_ascii_lowercase(),
        event_id: String::new(),
        matchup: String::new(),
        commence_time: String::new(),
    };
    let store = OddsQuoteStore::build(vec![quote.clone()]);

    let scored = pipeline
        .process_prop(&quote, &store)
        .await
        .context("analysis failed")?;

    display::banner("ANALYSIS", 80);
    println!("{} {}{} {} @ {:.2}", quote.player, side.prefix(), line, stat, price);
    println!(
        "Trends: {} ({:.0}% L10{})",
        scored.trends.trend_direction,
        scored.trends.last_10_hit_rate * 100.0,
        if scored.trends.has_injury_concern { ", injury concern" } else { "" }
    );
    println!("Edge: {}", display::signed_pct(scored.edge.edge_percentage));
    println!("Rating: {} ({} Confidence)", scored.edge.rating, scored.edge.confidence);
    println!("Kelly: {:.1}%", scored.stake.kelly_fraction * 100.0);
    println!("Reasoning: {}", scored.edge.reasoning);
    Ok(())
}

async fn run(cli: Cli, cfg: AppConfig) -> anyhow::Result<()> {
    let odds = odds_client(&cfg)?;

    match cli.command {
        Command::Games => {
            let games = odds.get_schedule().await;
            if games.is_empty() {
                println!("No games available.");
            } else {
                display::print_games(&games);
            }
        }
        Command::Scan { game, book, save } => {
            let pipeline =
                Arc::new(Pipeline::from_config(&cfg).context("failed to build pipeline")?);
            scan(&cfg, pipeline, &odds, game, book.as_deref(), save).await?;
        }
        Command::Interactive { game, book } => {
            let pipeline = Pipeline::from_config(&cfg).context("failed to build pipeline")?;
            interactive(&cfg, &pipeline, &odds, game, book.as_deref()).await?;
        }
        Command::Manual { player, stat, line, odds: raw, side } => {
            let pipeline = Pipeline::from_config(&cfg).context("failed to build pipeline")?;
            manual(&pipeline, player, stat, line, &raw, side).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "prop_gem=info,odds_client=info,llm_client=info,strategy=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    display::print_config_warnings(&display::config_warnings(&cfg));

    if let Err(e) = run(cli, cfg).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
