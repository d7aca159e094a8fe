use serde::{Deserialize, Serialize};

/// Stable team key: dense index into the season's team table, assigned at
/// seeding time in overall-seed order. All engine code compares teams by this
/// key; names only appear at the I/O boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub u16);

/// One seeded team and its mutable tournament status.
#[derive(Clone, Debug)]
pub struct Team {
    pub id: TeamId,
    pub name: String,

    /// 1..=68, lower is stronger. Unique within a season.
    pub overall_seed: u16,

    /// Seed within the team's region (1..=16).
    pub seed: u8,

    pub region: String,

    /// Slot within the seeding feed; drives initial game placement.
    pub slot: u16,

    pub play_in: bool,

    /// Still in the tournament. Forward-only: once false, never true again.
    pub alive: bool,

    /// Per-round probability of winning the game at that round, if the
    /// forecast feed provided one. Index matches the round index.
    pub forecast: Option<Vec<f64>>,

    /// Elo-like rating from the forecast feed.
    pub rating: Option<f64>,
}

impl Team {
    /// Probability of this team winning its game at `round`.
    pub fn forecast_at(&self, round: usize) -> Option<f64> {
        self.forecast.as_ref().and_then(|f| f.get(round)).copied()
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.seed, self.name)
    }
}

/// Season-setup input record for one team, as supplied by the seeding feed.
/// Records are expected in overall-seed order, strongest first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeededTeam {
    pub name: String,
    pub seed: u8,
    pub region: String,
    pub slot: u16,
    #[serde(default)]
    pub play_in: bool,
    #[serde(default)]
    pub forecast: Option<Vec<f64>>,
    #[serde(default)]
    pub rating: Option<f64>,
}
