//! Bracketeering - scoring and payout engine for NCAA bracket pools.
//!
//! The season's game graph is a binary tree addressed by game ID; everything
//! else (entry scores, bonuses, simulated outcomes, payouts) is derived from
//! the decided winners on demand. See [`season::SeasonState`] for the
//! authoritative state and [`sim::monte_carlo`] for the projection engine.

pub mod compare;
pub mod constants;
pub mod entry;
pub mod error;
pub mod game;
pub mod payout;
pub mod season;
pub mod sim;
pub mod team;

pub use compare::{
    bracket_compare, chalk_bracket, generate_bracket, rating_win_prob, WinnerRule,
};
pub use constants::{BONUS_POINTS, ROUND_NAMES, ROUND_POINTS};
pub use entry::{Entry, EntryScore, Slot};
pub use error::{Error, Result};
pub use payout::{update_payouts, League, Owner, OwnerStanding, PayoutRules};
pub use season::{SeasonConfig, SeasonState};
pub use sim::{
    enumerate_scenarios, monte_carlo, scenario_shares, streak_uniqueness, Scenario, WinShares,
};
pub use team::{SeededTeam, Team, TeamId};
