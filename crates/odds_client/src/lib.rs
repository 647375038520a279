//! The Odds API client.
//!
//! Fetches the league schedule and per-event player props across every
//! configured region, flattens them into `Quote`s, and falls back to
//! built-in demo data whenever the provider is unconfigured or unusable.

pub mod client;
pub mod convert;
pub mod demo;
pub mod envelope;

pub use client::OddsClient;
pub use convert::{american_to_decimal, decimal_to_american, parse_odds_input};
pub use envelope::{flatten_event, OddsEnvelope, OddsEvent};
