//! Pool entries ("brackets"): one predicted winner per game, plus everything
//! computed from them — realized and potential points, bonus pools, Elite
//! Eight hit counts, team depth, and the pre-tournament expectation scores.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use crate::compare::bonus_key;
use crate::constants::{BONUS_POINTS, MAX_SEED_GAP, ROUND_NAMES, ROUND_POINTS};
use crate::error::{Error, Result};
use crate::game;
use crate::season::SeasonState;
use crate::team::TeamId;

/// One (game, predicted winner) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub gid: u32,
    pub winner: TeamId,
}

/// A full set of predictions, one slot per game in the season's graph, held
/// in descending game-ID order (First Four first, championship last).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub bid: u32,
    pub slots: Vec<Slot>,
}

/// Derived scoring state for one entry. Pure function of the entry and the
/// current game winners; safe to recompute at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryScore {
    pub points: u32,
    pub bonus: u32,
    pub potential: u32,
    pub potential_bonus: u32,
    /// Correctly predicted winners of the round-3 games (IDs 8..=15).
    pub elite_eight: u32,
    /// Same count, assuming every still-alive pick keeps winning.
    pub elite_eight_potential: u32,
}

impl EntryScore {
    pub fn total(&self) -> u32 {
        self.points + self.bonus
    }

    pub fn total_potential(&self) -> u32 {
        self.potential + self.potential_bonus
    }
}

impl Entry {
    /// Build from unordered predictions; slots are sorted into canonical
    /// descending-ID order.
    pub fn from_predictions(bid: u32, predictions: Vec<(u32, TeamId)>) -> Self {
        let mut slots: Vec<Slot> = predictions
            .into_iter()
            .map(|(gid, winner)| Slot { gid, winner })
            .collect();
        slots.sort_by(|a, b| b.gid.cmp(&a.gid));
        Entry { bid, slots }
    }

    /// Predicted winner for a game, if the entry has a slot for it.
    pub fn slot_winner(&self, gid: u32) -> Option<TeamId> {
        self.slots
            .binary_search_by(|s| gid.cmp(&s.gid))
            .ok()
            .map(|i| self.slots[i].winner)
    }

    /// Check that the predictions are a valid completion of the bracket:
    /// exactly one slot per game in the season's graph, and every predicted
    /// winner either won its child game in this same entry or is seeded into
    /// that side of the matchup.
    pub fn validate(&self, season: &SeasonState) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.slots.len());
        for slot in &self.slots {
            season.game(slot.gid)?;
            if !seen.insert(slot.gid) {
                return Err(Error::InconsistentEntry {
                    bid: self.bid,
                    reason: format!("two slots for game {}", slot.gid),
                });
            }
        }
        let expected = season.gids_desc().count();
        if seen.len() != expected {
            return Err(Error::InconsistentEntry {
                bid: self.bid,
                reason: format!("{} slots, expected {expected}", seen.len()),
            });
        }

        for slot in &self.slots {
            let game = season.game(slot.gid)?;
            let (c1, c2) = game::children(slot.gid);
            let mut candidates = Vec::with_capacity(2);
            for (child, seeded) in [(c1, game.team1), (c2, game.team2)] {
                if let Some(winner) = self.slot_winner(child) {
                    candidates.push(winner);
                } else if let Some(team) = seeded {
                    candidates.push(team);
                }
            }
            if !candidates.contains(&slot.winner) {
                return Err(Error::InconsistentEntry {
                    bid: self.bid,
                    reason: format!(
                        "game {}: {:?} did not reach this game in the entry",
                        slot.gid,
                        season.team(slot.winner).name
                    ),
                });
            }
        }
        Ok(())
    }

    /// Score against the authoritative game state.
    ///
    /// A slot earns its game's points when the decided winner matches the
    /// prediction. Potential keeps the same points while the pick is still
    /// alive. Each bonus pool starts at full value per key and is zeroed the
    /// moment any game under the key misses — for the potential pool that
    /// means the instant a predicted team is eliminated, not when the key's
    /// games finish.
    pub fn score_against(&self, season: &SeasonState) -> Result<EntryScore> {
        // Per bonus key: [realized, potential] credit.
        let mut bonuses: HashMap<(usize, usize), [u32; 2]> = HashMap::new();
        let mut score = EntryScore::default();

        for slot in &self.slots {
            let game = season.game(slot.gid)?;
            let value = game.points();
            let (points, potential) = match game.winner {
                Some(winner) if winner == slot.winner => (value, value),
                _ if season.team(slot.winner).alive => (0, value),
                _ => (0, 0),
            };
            score.points += points;
            score.potential += potential;

            let key = bonus_key(slot.gid);
            let round = game.round();
            for (i, earned) in [points, potential].into_iter().enumerate() {
                if let Some(key) = key {
                    let credit = bonuses.entry(key).or_insert([BONUS_POINTS; 2]);
                    if earned == 0 {
                        credit[i] = 0;
                    } else if round == 3 {
                        if i == 0 {
                            score.elite_eight += 1;
                        } else {
                            score.elite_eight_potential += 1;
                        }
                    }
                }
            }
        }

        for [realized, potential] in bonuses.values() {
            score.bonus += realized;
            score.potential_bonus += potential;
        }
        Ok(score)
    }

    /// Deepest round this entry predicts `team` winning through, or `None`
    /// if the entry never picks it.
    pub fn team_depth(&self, team: TeamId) -> Option<usize> {
        self.slots
            .iter()
            .filter(|s| s.winner == team)
            .map(|s| game::round(s.gid))
            .max()
    }

    /// [`Entry::team_depth`] as a display name.
    pub fn team_depth_name(&self, team: TeamId) -> Option<&'static str> {
        self.team_depth(team).map(|rd| ROUND_NAMES[rd])
    }

    /// Forecast-weighted expectation: each slot contributes the predicted
    /// team's probability of winning that round times the round's points.
    /// Regional bonuses are deliberately not modeled here.
    pub fn expected_points(&self, season: &SeasonState) -> Result<f64> {
        let mut total = 0.0;
        for slot in &self.slots {
            let round = game::round(slot.gid);
            let team = season.team(slot.winner);
            let p = team
                .forecast_at(round)
                .ok_or_else(|| Error::MissingForecast(team.name.clone()))?;
            total += p * f64::from(ROUND_POINTS[round]);
        }
        Ok(total)
    }

    /// Continuous closeness to the chalk bracket: each slot is worth its
    /// points scaled by `1 - sqrt(seed_gap / 67)`, so a slot agreeing with
    /// chalk scores exactly 1.0 of its value. Seed gaps outside the field
    /// are clamped into the sqrt domain.
    pub fn chalk_similarity(&self, chalk: &Entry, season: &SeasonState) -> Result<f64> {
        let mut total = 0.0;
        for slot in &self.slots {
            let reference = chalk
                .slot_winner(slot.gid)
                .ok_or(Error::UnknownGame(slot.gid))?;
            let predicted = f64::from(season.team(slot.winner).overall_seed);
            let expected = f64::from(season.team(reference).overall_seed);
            let gap = (predicted - expected).clamp(0.0, MAX_SEED_GAP);
            let factor = 1.0 - (gap / MAX_SEED_GAP).sqrt();
            total += factor * f64::from(game::points(slot.gid));
        }
        Ok(total)
    }

    /// Expected length of a correct run along the streak game order: the sum
    /// of the running products of the picked teams' win probabilities. Early
    /// games weigh more since every later term requires the ones before it.
    pub fn heat_score(&self, season: &SeasonState, streak_gids: &[u32]) -> Result<f64> {
        let mut running = 1.0;
        let mut total = 0.0;
        for &gid in streak_gids {
            let winner = self.slot_winner(gid).ok_or(Error::UnknownGame(gid))?;
            let team = season.team(winner);
            let p = team
                .forecast_at(game::round(gid))
                .ok_or_else(|| Error::MissingForecast(team.name.clone()))?;
            running *= p;
            total += running;
        }
        Ok(total)
    }

    /// Serialize to the persisted text form: entry ID on the first line, then
    /// one `gameId,predictedWinnerName` line per slot in descending game-ID
    /// order.
    pub fn to_text(&self, season: &SeasonState) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.bid);
        for slot in &self.slots {
            let _ = writeln!(out, "{},{}", slot.gid, season.team(slot.winner).name);
        }
        out
    }

    /// Parse the persisted text form, resolving names against the season and
    /// validating the bracket structure. Unknown names and structural holes
    /// fail here rather than corrupting scoring later.
    pub fn from_text(text: &str, season: &SeasonState) -> Result<Entry> {
        let mut lines = text.lines().enumerate();
        let (_, first) = lines.next().ok_or(Error::Parse {
            line: 1,
            msg: "empty entry".to_string(),
        })?;
        let bid: u32 = first.trim().parse().map_err(|_| Error::Parse {
            line: 1,
            msg: format!("bad entry id {first:?}"),
        })?;

        let mut slots = Vec::new();
        let mut prev_gid = u32::MAX;
        for (i, line) in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (gid_str, name) = line.split_once(',').ok_or(Error::Parse {
                line: i + 1,
                msg: "expected gameId,teamName".to_string(),
            })?;
            let gid: u32 = gid_str.trim().parse().map_err(|_| Error::Parse {
                line: i + 1,
                msg: format!("bad game id {gid_str:?}"),
            })?;
            if gid >= prev_gid {
                return Err(Error::Parse {
                    line: i + 1,
                    msg: "game ids must strictly descend".to_string(),
                });
            }
            prev_gid = gid;
            let winner = season.team_id(name.trim())?;
            slots.push(Slot { gid, winner });
        }

        let entry = Entry { bid, slots };
        entry.validate(season)?;
        Ok(entry)
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P, season: &SeasonState) -> Result<()> {
        std::fs::write(path, self.to_text(season))?;
        Ok(())
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P, season: &SeasonState) -> Result<Entry> {
        let text = std::fs::read_to_string(path)?;
        Entry::from_text(&text, season)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::chalk_bracket;
    use crate::season::fixtures::{decide_all_chalk, demo_season};
    use rand::SeedableRng;

    #[test]
    fn test_round_trip_text_format() {
        let season = demo_season();
        let entry = chalk_bracket(&season, 7).unwrap();
        let text = entry.to_text(&season);
        let back = Entry::from_text(&text, &season).unwrap();
        assert_eq!(back, entry);
        // First line carries the ID, slots stay in descending order.
        assert_eq!(text.lines().next(), Some("7"));
    }

    #[test]
    fn test_unknown_name_fails_at_load() {
        let season = demo_season();
        let entry = chalk_bracket(&season, 1).unwrap();
        let text = entry.to_text(&season).replace("East 1 1", "Ringer U");
        assert!(matches!(
            Entry::from_text(&text, &season),
            Err(Error::UnknownTeam(_))
        ));
    }

    #[test]
    fn test_structural_inconsistency_detected() {
        let season = demo_season();
        let mut entry = chalk_bracket(&season, 1).unwrap();
        // Chalk champion is the top overall seed; replace the championship
        // pick with a team that reaches neither semifinal in this entry.
        let stranger = season.team_id("East 2 5").unwrap();
        let last = entry.slots.len() - 1;
        assert_eq!(entry.slots[last].gid, 1);
        entry.slots[last].winner = stranger;
        assert!(matches!(
            entry.validate(&season),
            Err(Error::InconsistentEntry { .. })
        ));
    }

    #[test]
    fn test_scoring_idempotent_and_chalk_perfect() {
        let mut season = demo_season();
        let entry = chalk_bracket(&season, 1).unwrap();
        decide_all_chalk(&mut season);

        let first = entry.score_against(&season).unwrap();
        let second = entry.score_against(&season).unwrap();
        assert_eq!(first, second);

        // Perfect bracket: all 141 game points, all 14 bonus keys.
        assert_eq!(first.points, 141);
        assert_eq!(first.bonus, 14 * BONUS_POINTS);
        assert_eq!(first.potential, first.points);
        assert_eq!(first.potential_bonus, first.bonus);
        assert_eq!(first.elite_eight, 8);
        assert_eq!(first.elite_eight_potential, 8);
    }

    #[test]
    fn test_potential_tracks_elimination() {
        let mut season = demo_season();
        let entry = chalk_bracket(&season, 1).unwrap();

        // Nothing decided: no points, full potential.
        let fresh = entry.score_against(&season).unwrap();
        assert_eq!(fresh.points, 0);
        assert_eq!(fresh.bonus, 0);
        assert_eq!(fresh.potential, 141);
        assert_eq!(fresh.potential_bonus, 14 * BONUS_POINTS);

        // An upset in game 39 (West 2 vs 15): the chalk entry rides the
        // 2-seed through rounds 1..=3, so its elimination kills 1+2+3 of
        // potential and zeroes the West bonus keys for those rounds now,
        // before the keys' other games resolve.
        let game = *season.game(39).unwrap();
        let (favorite, underdog) = game.matchup().unwrap();
        assert!(season.team(favorite).overall_seed < season.team(underdog).overall_seed);
        season.apply_result(39, underdog).unwrap();

        let upset = entry.score_against(&season).unwrap();
        assert_eq!(upset.points, 0);
        assert_eq!(upset.potential, 141 - (1 + 2 + 3));
        assert_eq!(upset.potential_bonus, fresh.potential_bonus - 3 * BONUS_POINTS);
        assert_eq!(upset.elite_eight_potential, 7);
    }

    #[test]
    fn test_bonus_key_all_or_nothing() {
        let mut season = demo_season();
        let entry = chalk_bracket(&season, 1).unwrap();

        // Decide everything chalk, then re-run one region's round-1 games:
        // they are already decided, so instead build the season fresh and
        // decide all but one game of the West round-1 key correctly.
        decide_all_chalk(&mut season);
        let full = entry.score_against(&season).unwrap();

        let mut partial = demo_season();
        // First Four first so round-1 matchups are complete.
        for gid in [113, 97, 81, 65] {
            let w = entry.slot_winner(gid).unwrap();
            partial.apply_result(gid, w).unwrap();
        }
        for gid in 33..=39 {
            let w = entry.slot_winner(gid).unwrap();
            partial.apply_result(gid, w).unwrap();
        }
        // Game 32 goes to the other side.
        let game = *partial.game(32).unwrap();
        let (t1, t2) = game.matchup().unwrap();
        let wrong = if entry.slot_winner(32) == Some(t1) { t2 } else { t1 };
        partial.apply_result(32, wrong).unwrap();

        let spoiled = entry.score_against(&partial).unwrap();
        // Four First Four hits plus seven of the eight West round-1 games:
        // points accrue, but the spoiled key's bonus does not.
        assert_eq!(spoiled.points, 4 + 7);
        assert_eq!(spoiled.bonus, 0);
        // The full chalk playout did credit that key.
        assert_eq!(full.bonus, 14 * BONUS_POINTS);
    }

    #[test]
    fn test_team_depth() {
        let season = demo_season();
        let entry = chalk_bracket(&season, 1).unwrap();
        let champion = season.team_id("East 1 1").unwrap();
        assert_eq!(entry.team_depth(champion), Some(6));
        assert_eq!(entry.team_depth_name(champion), Some("Championship"));

        // A 2-seed wins through round 3, then falls in its regional final.
        let two_seed = season.team_id("East 2 5").unwrap();
        assert_eq!(entry.team_depth(two_seed), Some(3));

        // A 16-seed play-in team wins only its First Four game.
        let longshot = season
            .teams()
            .iter()
            .find(|t| t.play_in)
            .map(|t| t.id)
            .unwrap();
        let depth = entry.team_depth(longshot);
        assert!(depth == Some(0) || depth.is_none());
    }

    #[test]
    fn test_from_predictions_sorts_descending() {
        let season = demo_season();
        let chalk = chalk_bracket(&season, 1).unwrap();
        let mut shuffled: Vec<(u32, TeamId)> =
            chalk.slots.iter().map(|s| (s.gid, s.winner)).collect();
        shuffled.reverse();
        assert_eq!(Entry::from_predictions(1, shuffled), chalk);
    }

    #[test]
    fn test_expected_points_favors_stronger_picks() {
        let season = demo_season();
        let chalk = chalk_bracket(&season, 1).unwrap();
        let anti = crate::compare::generate_bracket(
            &season,
            crate::compare::WinnerRule::AntiChalk,
            2,
            &mut rand_chacha::ChaCha8Rng::seed_from_u64(0),
        )
        .unwrap();
        let strong = chalk.expected_points(&season).unwrap();
        let weak = anti.expected_points(&season).unwrap();
        assert!(strong > weak);
        assert!(weak > 0.0);
    }

    #[test]
    fn test_chalk_similarity_of_chalk_is_full_value() {
        let season = demo_season();
        let chalk = chalk_bracket(&season, 1).unwrap();
        let score = chalk.chalk_similarity(&chalk, &season).unwrap();
        // Factor 1.0 on every slot: the full 141 available points.
        assert!((score - 141.0).abs() < 1e-9);
    }

    #[test]
    fn test_chalk_similarity_decreases_with_divergence() {
        let season = demo_season();
        let chalk = chalk_bracket(&season, 1).unwrap();
        let anti = crate::compare::generate_bracket(
            &season,
            crate::compare::WinnerRule::AntiChalk,
            2,
            &mut rand_chacha::ChaCha8Rng::seed_from_u64(0),
        )
        .unwrap();
        let score = anti.chalk_similarity(&chalk, &season).unwrap();
        assert!(score < 141.0);
        assert!(score >= 0.0);
    }

    #[test]
    fn test_heat_score_weights_early_games() {
        let season = demo_season();
        let entry = chalk_bracket(&season, 1).unwrap();
        let gids = season.config.streak_gids.clone();
        let score = entry.heat_score(&season, &gids).unwrap();

        // Hand-rolled: sum of running products of the picked teams' forecast
        // probabilities along the streak order.
        let mut running = 1.0;
        let mut expected = 0.0;
        for &gid in &gids {
            let team = season.team(entry.slot_winner(gid).unwrap());
            running *= team.forecast_at(1).unwrap();
            expected += running;
        }
        assert!((score - expected).abs() < 1e-12);
        assert!(score < gids.len() as f64);
    }
}
