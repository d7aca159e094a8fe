//! Owners, the pool, and the money: aggregates per owner, the Elite Eight
//! tie-break, and the four payout categories netted against the buy-in.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryScore};
use crate::error::{Error, Result};
use crate::season::SeasonState;

/// One pool participant and the entries they drafted.
#[derive(Clone, Debug)]
pub struct Owner {
    pub name: String,
    pub entries: Vec<Entry>,
    /// Set by a human operator; the engine pays it out but never derives it.
    pub streak_winner: bool,
}

/// The whole pool.
#[derive(Clone, Debug, Default)]
pub struct League {
    pub owners: Vec<Owner>,
}

impl League {
    /// Assemble the pool from loaded entries and the draft mapping
    /// (owner name, entry ID). Owners appear in first-pick order; a pick of
    /// an entry that was never loaded is fatal.
    pub fn from_draft(entries: Vec<Entry>, draft: &[(String, u32)]) -> Result<League> {
        let mut pool: HashMap<u32, Entry> =
            entries.into_iter().map(|e| (e.bid, e)).collect();

        let mut owners: Vec<Owner> = Vec::new();
        let mut taken: HashSet<u32> = HashSet::new();
        for (name, bid) in draft {
            let entry = match pool.remove(bid) {
                Some(entry) => entry,
                None if taken.contains(bid) => {
                    return Err(Error::League(format!(
                        "entry {bid} drafted more than once"
                    )))
                }
                None => return Err(Error::UnknownEntry(*bid)),
            };
            taken.insert(*bid);
            match owners.iter_mut().find(|o| &o.name == name) {
                Some(owner) => owner.entries.push(entry),
                None => owners.push(Owner {
                    name: name.clone(),
                    entries: vec![entry],
                    streak_winner: false,
                }),
            }
        }
        if !pool.is_empty() {
            warn!("{} entries went undrafted", pool.len());
        }
        Ok(League { owners })
    }

    pub fn owner(&self, name: &str) -> Option<&Owner> {
        self.owners.iter().find(|o| o.name == name)
    }

    /// Flag the streak side-bet winner. Purely operator-driven.
    pub fn set_streak_winner(&mut self, name: &str) -> Result<()> {
        let owner = self
            .owners
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| Error::League(format!("no owner named {name:?}")))?;
        owner.streak_winner = true;
        Ok(())
    }
}

/// Prize amounts per category. Every category is independent and additive;
/// the buy-in nets against the sum.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PayoutRules {
    pub buy_in: f64,
    pub best_entry: f64,
    pub sum_of_2: f64,
    pub elite_eight: f64,
    pub streak: f64,
}

impl Default for PayoutRules {
    fn default() -> Self {
        PayoutRules {
            buy_in: 20.0,
            best_entry: 20.0,
            sum_of_2: 80.0,
            elite_eight: 20.0,
            streak: 20.0,
        }
    }
}

impl PayoutRules {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Per-owner aggregates and computed payout.
#[derive(Clone, Debug)]
pub struct OwnerStanding {
    pub name: String,
    /// Highest single-entry total (points plus bonuses).
    pub best: u32,
    /// Two highest entry totals combined.
    pub sum_of_2: u32,
    /// Highest Elite Eight hit count, for display.
    pub max_elite_eight: u32,
    pub payout: f64,
}

/// The Elite Eight house rule. Each owner's per-entry hit counts are sorted
/// ascending; with k entries the elimination looks at the highest, then the
/// lowest, then the 2nd-highest, then the 2nd-lowest, alternating max/min,
/// and stops the moment one owner stands alone. Whoever survives all rounds
/// splits the prize.
pub fn elite_eight_tiebreak(counts_per_owner: &[Vec<u32>]) -> Result<Vec<usize>> {
    if counts_per_owner.is_empty() {
        return Err(Error::EmptyTieSet);
    }
    let per_owner = counts_per_owner[0].len();
    if counts_per_owner.iter().any(|c| c.len() != per_owner) {
        return Err(Error::League(
            "owners hold differing entry counts".to_string(),
        ));
    }

    let mut remaining: Vec<usize> = (0..counts_per_owner.len()).collect();
    for depth in 0..per_owner {
        let pick_max = depth % 2 == 0;
        let idx = if pick_max {
            per_owner - 1 - depth / 2
        } else {
            depth / 2
        };

        let pivot = remaining
            .iter()
            .map(|&o| counts_per_owner[o][idx])
            .reduce(|a, b| if pick_max { a.max(b) } else { a.min(b) })
            .ok_or(Error::EmptyTieSet)?;
        remaining.retain(|&o| counts_per_owner[o][idx] == pivot);

        if remaining.len() == 1 {
            break;
        }
    }
    Ok(remaining)
}

/// Split one category's prize among its tied winners.
fn share(payouts: &mut [f64], winners: &[usize], amount: f64) -> Result<()> {
    if winners.is_empty() {
        return Err(Error::EmptyTieSet);
    }
    let cut = amount / winners.len() as f64;
    for &w in winners {
        payouts[w] += cut;
    }
    Ok(())
}

/// Indices holding the maximum value. Never empty for non-empty input.
pub(crate) fn argmax(values: &[u32]) -> Vec<usize> {
    let mut best = 0;
    let mut winners = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if v > best || winners.is_empty() {
            best = v;
            winners = vec![i];
        } else if v == best {
            winners.push(i);
        }
    }
    winners
}

/// Recompute every owner's aggregates and payout from scratch.
pub fn update_payouts(
    league: &League,
    season: &SeasonState,
    rules: &PayoutRules,
) -> Result<Vec<OwnerStanding>> {
    if league.owners.is_empty() {
        return Ok(Vec::new());
    }

    let mut bests = Vec::with_capacity(league.owners.len());
    let mut sums_of_2 = Vec::with_capacity(league.owners.len());
    let mut elite_eights = Vec::with_capacity(league.owners.len());
    let mut max_elite_eights = Vec::with_capacity(league.owners.len());

    for owner in &league.owners {
        let scores: Vec<EntryScore> = owner
            .entries
            .iter()
            .map(|e| e.score_against(season))
            .collect::<Result<_>>()?;
        if scores.is_empty() {
            return Err(Error::League(format!(
                "owner {:?} holds no entries",
                owner.name
            )));
        }

        let mut totals: Vec<u32> = scores.iter().map(EntryScore::total).collect();
        totals.sort_unstable_by(|a, b| b.cmp(a));
        bests.push(totals[0]);
        sums_of_2.push(totals[0] + totals.get(1).copied().unwrap_or(0));

        let mut hits: Vec<u32> = scores.iter().map(|s| s.elite_eight).collect();
        hits.sort_unstable();
        max_elite_eights.push(*hits.last().expect("nonempty"));
        elite_eights.push(hits);
    }

    let mut payouts = vec![-rules.buy_in; league.owners.len()];
    share(&mut payouts, &elite_eight_tiebreak(&elite_eights)?, rules.elite_eight)?;
    share(&mut payouts, &argmax(&bests), rules.best_entry)?;
    share(&mut payouts, &argmax(&sums_of_2), rules.sum_of_2)?;
    for (i, owner) in league.owners.iter().enumerate() {
        if owner.streak_winner {
            payouts[i] += rules.streak;
        }
    }

    let standings: Vec<OwnerStanding> = league
        .owners
        .iter()
        .enumerate()
        .map(|(i, owner)| OwnerStanding {
            name: owner.name.clone(),
            best: bests[i],
            sum_of_2: sums_of_2[i],
            max_elite_eight: max_elite_eights[i],
            payout: payouts[i],
        })
        .collect();

    info!("payouts recomputed for {} owners", standings.len());
    Ok(standings)
}
