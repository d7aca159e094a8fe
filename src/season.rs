//! Season state: the seeded team table and the bracket game graph.
//!
//! The state is built once from the seeding feed and then only moves forward
//! through [`SeasonState::apply_result`], one real-world game at a time.
//! Everything derived from it (entry scores, simulated brackets, payouts) is
//! recomputed from the game winners and never stored here.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::game::{self, Game};
use crate::team::{SeededTeam, Team, TeamId};

/// Per-year configuration. The seeding feed orders regions differently from
/// the pool's bracket layout, and permutes them between years, so both the
/// region-name table and the slot offsets are data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeasonConfig {
    pub year: u16,

    /// Region display names in bracket order; index 1..=4 from
    /// [`crate::game::region`] maps to `region_names[idx - 1]`.
    pub region_names: [String; 4],

    /// Added to `slot / 4` to place a region's teams in their round-1 games.
    pub region_offsets: HashMap<String, u32>,

    /// Game IDs of the streak side-bet, in the order the streak is scored.
    #[serde(default)]
    pub streak_gids: Vec<u32>,
}

impl SeasonConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// The authoritative tournament state for one season.
#[derive(Clone, Debug)]
pub struct SeasonState {
    pub config: SeasonConfig,
    teams: Vec<Team>,
    by_name: HashMap<String, TeamId>,
    games: BTreeMap<u32, Game>,
}

impl SeasonState {
    /// Build the season from the seeding feed. Records must arrive in
    /// overall-seed order, strongest team first.
    pub fn new(config: SeasonConfig, seeds: Vec<SeededTeam>) -> Result<Self> {
        let mut teams = Vec::with_capacity(seeds.len());
        let mut by_name = HashMap::with_capacity(seeds.len());
        let mut games: BTreeMap<u32, Game> = BTreeMap::new();

        // The main draw always exists, even before any team is placed.
        for gid in 1..=63 {
            games.insert(gid, Game::new(gid));
        }

        for (i, seed) in seeds.into_iter().enumerate() {
            let id = TeamId(i as u16);
            if by_name.insert(seed.name.clone(), id).is_some() {
                return Err(Error::SeedData(format!(
                    "duplicate team {:?}",
                    seed.name
                )));
            }

            let offset =
                *config.region_offsets.get(&seed.region).ok_or_else(|| {
                    Error::SeedData(format!(
                        "region {:?} has no slot offset",
                        seed.region
                    ))
                })?;

            let mut gid = u32::from(seed.slot) / 4 + offset;
            let mut is_team1 = seed.slot % 4 == 0;

            // Play-in teams contest the team2 side of a round-1 game; they
            // seed the First Four child instead of the game itself.
            if seed.play_in {
                gid = 2 * gid + 1;
                is_team1 = seed.slot % 2 == 0;
            }

            // Direct seeds land in round 1, play-ins on the odd First Four
            // IDs. Anything else is a corrupt slot/offset combination.
            let in_band = if seed.play_in {
                (65..=127).contains(&gid) && gid % 2 == 1
            } else {
                (32..=63).contains(&gid)
            };
            if !in_band {
                return Err(Error::SeedData(format!(
                    "team {:?} lands in game {gid}, outside the bracket",
                    seed.name
                )));
            }

            let entry = games.entry(gid).or_insert_with(|| Game::new(gid));
            let side = if is_team1 {
                &mut entry.team1
            } else {
                &mut entry.team2
            };
            if side.is_some() {
                return Err(Error::SeedData(format!(
                    "two teams seeded into the same side of game {gid}"
                )));
            }
            *side = Some(id);

            teams.push(Team {
                id,
                name: seed.name,
                overall_seed: (i + 1) as u16,
                seed: seed.seed,
                region: seed.region,
                slot: seed.slot,
                play_in: seed.play_in,
                alive: true,
                forecast: seed.forecast,
                rating: seed.rating,
            });
        }

        info!(
            "season {}: {} teams, {} games seeded",
            config.year,
            teams.len(),
            games.len()
        );

        Ok(SeasonState {
            config,
            teams,
            by_name,
            games,
        })
    }

    pub fn team(&self, id: TeamId) -> &Team {
        &self.teams[id.0 as usize]
    }

    /// Resolve an externally supplied name. Failing loudly here is the point:
    /// payouts require every referenced team to exist.
    pub fn team_id(&self, name: &str) -> Result<TeamId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownTeam(name.to_string()))
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn game(&self, gid: u32) -> Result<&Game> {
        self.games.get(&gid).ok_or(Error::UnknownGame(gid))
    }

    /// All game IDs, descending: First Four and round 1 first, championship
    /// last. This is the order in which winners become available, so it is
    /// also the generation and persistence order.
    pub fn gids_desc(&self) -> impl Iterator<Item = u32> + '_ {
        self.games.keys().rev().copied()
    }

    /// Snapshot of the game graph, for simulated completions.
    pub fn games_snapshot(&self) -> BTreeMap<u32, Game> {
        self.games.clone()
    }

    /// Region display name for a game.
    pub fn region_name(&self, gid: u32) -> &str {
        match game::region(gid) {
            0 => "No Region",
            idx => &self.config.region_names[idx - 1],
        }
    }

    /// Winner of a decided game.
    pub fn decided_winner(&self, gid: u32) -> Result<TeamId> {
        self.game(gid)?.winner.ok_or(Error::UndecidedGame(gid))
    }

    /// The one state transition: record a real-world result. Sets the winner,
    /// eliminates the loser, and propagates the winner into the parent game's
    /// team1 or team2 slot by ID parity. Re-applying the same result is a
    /// no-op; contradicting a decided game is an error.
    pub fn apply_result(&mut self, gid: u32, winner: TeamId) -> Result<()> {
        let game = self.games.get(&gid).ok_or(Error::UnknownGame(gid))?;
        let (team1, team2) = game.matchup().ok_or_else(|| Error::InvalidResult {
            gid,
            reason: "participants not yet known".to_string(),
        })?;

        if let Some(decided) = game.winner {
            if decided == winner {
                return Ok(());
            }
            return Err(Error::InvalidResult {
                gid,
                reason: "game already decided".to_string(),
            });
        }

        let loser = if winner == team1 {
            team2
        } else if winner == team2 {
            team1
        } else {
            return Err(Error::InvalidResult {
                gid,
                reason: format!("{:?} is not a participant", self.team(winner).name),
            });
        };

        self.games.get_mut(&gid).expect("checked above").winner = Some(winner);
        self.teams[loser.0 as usize].alive = false;

        if let Some(next) = game::parent(gid) {
            let parent = self
                .games
                .get_mut(&next)
                .ok_or(Error::UnknownGame(next))?;
            if game::feeds_team1(gid) {
                parent.team1 = Some(winner);
            } else {
                parent.team2 = Some(winner);
            }
        }

        debug!(
            "game {gid}: {} over {}",
            self.team(winner).name,
            self.team(loser).name
        );
        Ok(())
    }

    /// Name-resolving convenience for (gameId, winningTeam) events.
    pub fn apply_named_result(&mut self, gid: u32, winner: &str) -> Result<()> {
        let id = self.team_id(winner)?;
        self.apply_result(gid, id)
    }
}
