//! Built-in fallback data for unconfigured or failing providers.

use chrono::Utc;
use common::{BetSide, Game, Quote, StatKind};

pub const DEMO_MATCHUP: &str = "Demo Game";

pub fn demo_schedule() -> Vec<Game> {
    let now = Utc::now().to_rfc3339();
    vec![
        Game {
            id: "demo1".into(),
            home_team: "Boston Celtics".into(),
            away_team: "Los Angeles Lakers".into(),
            commence_time: now.clone(),
        },
        Game {
            id: "demo2".into(),
            home_team: "Milwaukee Bucks".into(),
            away_team: "Phoenix Suns".into(),
            commence_time: now,
        },
    ]
}

pub fn demo_props(event_id: &str) -> Vec<Quote> {
    let now = Utc::now().to_rfc3339();
    let rows = [
        ("LeBron James", StatKind::Points, 28.5, 1.91, "DraftKings"),
        ("LeBron James", StatKind::Points, 28.5, 1.95, "Bet365"),
        ("Jayson Tatum", StatKind::Points, 26.5, 1.91, "DraftKings"),
        ("Jayson Tatum", StatKind::Rebounds, 8.5, 1.91, "DraftKings"),
    ];

    rows.into_iter()
        .map(|(player, stat, line, price, book)| Quote {
            player: player.into(),
            stat,
            side: BetSide::Over,
            line,
            price,
            book: book.into(),
            book_key: book.to_ascii_lowercase().replace(' ', ""),
            event_id: event_id.into(),
            matchup: DEMO_MATCHUP.into(),
            commence_time: now.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_data_shape() {
        let games = demo_schedule();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "demo1");
        assert_eq!(games[1].matchup(), "Phoenix Suns @ Milwaukee Bucks");

        let props = demo_props("demo2");
        assert_eq!(props.len(), 4);
        assert!(props.iter().all(|q| q.event_id == "demo2"));
        assert_eq!(props[1].book_key, "bet365");
    }
}
