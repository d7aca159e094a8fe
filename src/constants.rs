/// Points awarded for a correct pick, indexed by round.
pub const ROUND_POINTS: [u32; 7] = [1, 1, 2, 3, 5, 8, 13];

/// Display names, indexed by round.
pub const ROUND_NAMES: [&str; 7] = [
    "First Four",
    "1st Round",
    "2nd Round",
    "Sweet Sixteen",
    "Elite Eight",
    "Final Four",
    "Championship",
];

/// Awarded for predicting every game under one bonus key correctly.
pub const BONUS_POINTS: u32 = 5;

/// Logistic scaling applied to rating differences when converting them to a
/// win probability. Calibrated against historical runs; must not change.
pub const RATING_SCALE: f64 = 0.175;

/// Teams in the full field, First Four included.
pub const FIELD_SIZE: usize = 68;

/// Largest possible overall-seed gap between two teams in the field.
pub const MAX_SEED_GAP: f64 = (FIELD_SIZE - 1) as f64;
