//! Projection over future outcomes: Monte Carlo win shares, exhaustive
//! scenario enumeration over a small set of open games, and the streak
//! uniqueness calculation for the side-bet.

use std::collections::HashMap;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::compare::{bracket_compare, generate_bracket, generate_bracket_with, WinnerRule};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::payout::{argmax, League};
use crate::season::SeasonState;
use crate::team::TeamId;

/// Accumulated win credit per owner, one unit per trial per category, split
/// evenly among that trial's tied winners. Sums to the trial count within
/// floating error.
#[derive(Clone, Debug)]
pub struct WinShares {
    pub trials: usize,
    pub best: HashMap<String, f64>,
    pub sum_of_2: HashMap<String, f64>,
    pub streak: Option<HashMap<String, f64>>,
}

/// Length of the initial run of correct picks along the streak game order.
pub fn streak_length(entry: &Entry, reference: &Entry, streak_gids: &[u32]) -> usize {
    streak_gids
        .iter()
        .take_while(|&&gid| {
            entry.slot_winner(gid).is_some() && entry.slot_winner(gid) == reference.slot_winner(gid)
        })
        .count()
}

/// One trial's category winners, as owner indices.
struct TrialWinners {
    best: Vec<usize>,
    sum_of_2: Vec<usize>,
    streak: Option<Vec<usize>>,
}

fn trial_winners(
    league: &League,
    truth: &Entry,
    streak_gids: Option<&[u32]>,
) -> TrialWinners {
    let mut bests = Vec::with_capacity(league.owners.len());
    let mut sums = Vec::with_capacity(league.owners.len());
    let mut streaks = Vec::with_capacity(league.owners.len());

    for owner in &league.owners {
        let mut points: Vec<u32> = owner
            .entries
            .iter()
            .map(|e| bracket_compare(e, truth))
            .collect();
        points.sort_unstable_by(|a, b| b.cmp(a));
        bests.push(points.first().copied().unwrap_or(0));
        sums.push(points.iter().take(2).sum());

        if let Some(gids) = streak_gids {
            let longest = owner
                .entries
                .iter()
                .map(|e| streak_length(e, truth, gids))
                .max()
                .unwrap_or(0);
            streaks.push(longest as u32);
        }
    }

    TrialWinners {
        best: argmax(&bests),
        sum_of_2: argmax(&sums),
        streak: streak_gids.map(|_| argmax(&streaks)),
    }
}

/// Run `n` Monte Carlo trials. Each trial completes the bracket with `rule`
/// (normally [`WinnerRule::TruthThenProb`]: decided games stay decided, open
/// games follow the rating model), scores every owner against it, and
/// credits the trial's winners. Trials are independent, so they run in
/// parallel; a fixed `seed` makes the whole run reproducible, and a
/// deterministic rule makes every trial identical.
pub fn monte_carlo(
    season: &SeasonState,
    league: &League,
    rule: WinnerRule,
    n: usize,
    seed: Option<u64>,
    include_streak: bool,
) -> Result<WinShares> {
    if league.owners.is_empty() {
        return Err(Error::EmptyTieSet);
    }
    let streak_gids = include_streak.then(|| season.config.streak_gids.as_slice());

    let mut master = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let trial_seeds: Vec<u64> = (0..n).map(|_| master.gen()).collect();

    let trials: Vec<TrialWinners> = trial_seeds
        .par_iter()
        .map(|&trial_seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(trial_seed);
            let truth = generate_bracket(season, rule, 0, &mut rng)?;
            Ok(trial_winners(league, &truth, streak_gids))
        })
        .collect::<Result<_>>()?;

    let mut shares = WinShares {
        trials: n,
        best: zero_shares(league),
        sum_of_2: zero_shares(league),
        streak: include_streak.then(|| zero_shares(league)),
    };
    for trial in trials {
        credit(&mut shares.best, league, &trial.best)?;
        credit(&mut shares.sum_of_2, league, &trial.sum_of_2)?;
        if let (Some(map), Some(winners)) = (shares.streak.as_mut(), trial.streak.as_ref()) {
            credit(map, league, winners)?;
        }
    }

    debug!("monte carlo: {n} trials over {} owners", league.owners.len());
    Ok(shares)
}

fn zero_shares(league: &League) -> HashMap<String, f64> {
    league
        .owners
        .iter()
        .map(|o| (o.name.clone(), 0.0))
        .collect()
}

fn credit(map: &mut HashMap<String, f64>, league: &League, winners: &[usize]) -> Result<()> {
    if winners.is_empty() {
        return Err(Error::EmptyTieSet);
    }
    let cut = 1.0 / winners.len() as f64;
    for &w in winners {
        *map.entry(league.owners[w].name.clone()).or_insert(0.0) += cut;
    }
    Ok(())
}

/// One fully enumerated completion over the chosen open games.
#[derive(Clone, Debug)]
pub struct Scenario {
    /// Forced winner of each game in `sim_gids`, in input order.
    pub winners: Vec<TeamId>,
    /// Rating-model probability of this exact combination.
    pub probability: f64,
    pub best: Vec<String>,
    pub best_points: u32,
    pub sum_of_2: Vec<String>,
    pub sum_of_2_points: u32,
}

/// Exhaustively enumerate all `2^k` outcomes of `sim_gids`, weighting each
/// by the rating model and reporting the category winners under each. Every
/// game outside the set must already be decided, so the enumeration is the
/// complete and exact distribution over what remains.
pub fn enumerate_scenarios(
    season: &SeasonState,
    league: &League,
    sim_gids: &[u32],
) -> Result<Vec<Scenario>> {
    if league.owners.is_empty() {
        return Err(Error::EmptyTieSet);
    }
    if sim_gids.len() > 20 {
        return Err(Error::League(format!(
            "{} open games is too many to enumerate",
            sim_gids.len()
        )));
    }
    let positions: HashMap<u32, usize> = sim_gids
        .iter()
        .enumerate()
        .map(|(i, &gid)| (gid, i))
        .collect();
    for gid in season.gids_desc() {
        if !positions.contains_key(&gid) {
            season.decided_winner(gid)?;
        }
    }

    let mut scenarios = Vec::with_capacity(1 << sim_gids.len());
    for mask in 0u32..(1u32 << sim_gids.len()) {
        let mut probability = 1.0;
        let truth = generate_bracket_with(season, 0, |game| {
            let Some(&i) = positions.get(&game.gid) else {
                // Outside the sim set everything is decided; follow truth.
                let (t1, _) = game.matchup().ok_or(Error::UndecidedGame(game.gid))?;
                return Ok(game.winner.ok_or(Error::UndecidedGame(game.gid))? == t1);
            };
            let (t1, t2) = game.matchup().ok_or(Error::UndecidedGame(game.gid))?;
            let team1 = season.team(t1);
            let team2 = season.team(t2);
            let r1 = team1
                .rating
                .ok_or_else(|| Error::MissingRating(team1.name.clone()))?;
            let r2 = team2
                .rating
                .ok_or_else(|| Error::MissingRating(team2.name.clone()))?;
            let p1 = crate::compare::rating_win_prob(r1, r2);
            let team1_wins = (mask >> i) & 1 == 1;
            probability *= if team1_wins { p1 } else { 1.0 - p1 };
            Ok(team1_wins)
        })?;

        let outcome = trial_winners(league, &truth, None);
        let names = |set: &[usize]| -> Vec<String> {
            set.iter().map(|&i| league.owners[i].name.clone()).collect()
        };
        let best_points = league
            .owners
            .iter()
            .flat_map(|o| o.entries.iter().map(|e| bracket_compare(e, &truth)))
            .max()
            .unwrap_or(0);
        let sum_points = league
            .owners
            .iter()
            .map(|o| {
                let mut pts: Vec<u32> =
                    o.entries.iter().map(|e| bracket_compare(e, &truth)).collect();
                pts.sort_unstable_by(|a, b| b.cmp(a));
                pts.iter().take(2).sum::<u32>()
            })
            .max()
            .unwrap_or(0);

        scenarios.push(Scenario {
            winners: sim_gids
                .iter()
                .map(|&gid| truth.slot_winner(gid).ok_or(Error::UnknownGame(gid)))
                .collect::<Result<_>>()?,
            probability,
            best: names(&outcome.best),
            best_points,
            sum_of_2: names(&outcome.sum_of_2),
            sum_of_2_points: sum_points,
        });
    }
    Ok(scenarios)
}

/// Collapse an enumerated scenario set into probability-weighted win shares
/// per owner, for best-single and sum-of-2. Over a complete enumeration each
/// map sums to 1.
pub fn scenario_shares(
    scenarios: &[Scenario],
) -> (HashMap<String, f64>, HashMap<String, f64>) {
    let mut best = HashMap::new();
    let mut sum_of_2 = HashMap::new();
    for scenario in scenarios {
        let cut = scenario.probability / scenario.best.len() as f64;
        for name in &scenario.best {
            *best.entry(name.clone()).or_insert(0.0) += cut;
        }
        let cut = scenario.probability / scenario.sum_of_2.len() as f64;
        for name in &scenario.sum_of_2 {
            *sum_of_2.entry(name.clone()).or_insert(0.0) += cut;
        }
    }
    (best, sum_of_2)
}

/// For each entry, how many streak games it takes before its picks separate
/// it from every other entry — a prerequisite to winning the streak side-bet
/// outright. Entries that never separate are absent from the result.
pub fn streak_uniqueness(
    entries: &[Entry],
    streak_gids: &[u32],
) -> Result<HashMap<u32, usize>> {
    let mut uniqueness = HashMap::new();
    let mut groups: Vec<Vec<&Entry>> = vec![entries.iter().collect()];

    for (i, &gid) in streak_gids.iter().enumerate() {
        let mut regroups = Vec::new();
        for group in groups {
            let mut by_pick: HashMap<TeamId, Vec<&Entry>> = HashMap::new();
            for entry in group {
                let pick = entry.slot_winner(gid).ok_or(Error::UnknownGame(gid))?;
                by_pick.entry(pick).or_default().push(entry);
            }
            for bucket in by_pick.into_values() {
                if bucket.len() == 1 {
                    uniqueness.insert(bucket[0].bid, i + 1);
                } else {
                    regroups.push(bucket);
                }
            }
        }
        groups = regroups;
        if groups.is_empty() {
            break;
        }
    }
    Ok(uniqueness)
}
