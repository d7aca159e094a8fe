use thiserror::Error;

/// Errors surfaced by the scoring, projection, and payout engines.
///
/// Structural and reference errors are fatal for the entry or season being
/// loaded. Undecided games are only an error where a fully decided reference
/// is required; scoring paths treat them as "not yet scorable" instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A team name from external data (draft, entry file) has no seeded Team.
    #[error("unknown team {0:?}")]
    UnknownTeam(String),

    /// A game ID outside the bracket, or absent from the season's graph.
    #[error("unknown game {0}")]
    UnknownGame(u32),

    /// A decided winner was required but the game is still open.
    #[error("game {0} is undecided")]
    UndecidedGame(u32),

    /// A result event that contradicts the current game state.
    #[error("invalid result for game {gid}: {reason}")]
    InvalidResult { gid: u32, reason: String },

    /// The seeding feed is internally inconsistent.
    #[error("bad seed data: {0}")]
    SeedData(String),

    /// An entry's slots are not a valid completion of the bracket tree.
    #[error("entry {bid} is inconsistent: {reason}")]
    InconsistentEntry { bid: u32, reason: String },

    /// A rating-based winner rule hit a team with no rating.
    #[error("team {0:?} has no rating")]
    MissingRating(String),

    /// An expectation score hit a team with no forecast vector.
    #[error("team {0:?} has no forecast")]
    MissingForecast(String),

    /// A draft pick references an entry ID that was never loaded.
    #[error("draft references unknown entry {0}")]
    UnknownEntry(u32),

    /// The pool's owner/entry shape violates a payout precondition.
    #[error("league: {0}")]
    League(String),

    /// A payout split over an empty tie set. Tie sets are built by first
    /// collecting the maximizing element, so this is an invariant violation.
    #[error("payout split over an empty tie set")]
    EmptyTieSet,

    #[error("malformed entry file at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
