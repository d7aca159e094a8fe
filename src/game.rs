//! Bracket graph indexing.
//!
//! Games form a complete binary tree keyed by integer ID: the championship is
//! game 1 and the children of game `g` are `2g` and `2g + 1`. Round, region,
//! and point value all derive from the ID's bit pattern, so the graph itself
//! never needs to be walked to answer "where is this game".

use crate::constants::ROUND_POINTS;
use crate::team::TeamId;

/// Round index for a game ID: 6 for the championship down to 0 for the
/// First Four (IDs 64..=127).
pub fn round(gid: u32) -> usize {
    debug_assert!((1..=127).contains(&gid));
    7 - (u32::BITS - gid.leading_zeros()) as usize
}

/// Region index (1..=4) for rounds 1..=4, or 0 where regions do not apply
/// (First Four, Final Four, Championship). The index maps into the season's
/// configured region-name table.
pub fn region(gid: u32) -> usize {
    let rd = round(gid);
    if rd == 0 || rd > 4 {
        return 0;
    }
    (gid >> (4 - rd)) as usize - 3
}

/// Points a correct pick of this game is worth.
pub fn points(gid: u32) -> u32 {
    ROUND_POINTS[round(gid)]
}

/// Parent game, or `None` for the championship.
pub fn parent(gid: u32) -> Option<u32> {
    if gid == 1 {
        None
    } else {
        Some(gid / 2)
    }
}

/// Child game IDs. Only meaningful while the children are inside the bracket
/// (IDs <= 127).
pub fn children(gid: u32) -> (u32, u32) {
    (2 * gid, 2 * gid + 1)
}

/// Whether this game's winner lands in the parent's team1 slot (even IDs) or
/// team2 slot (odd IDs).
pub fn feeds_team1(gid: u32) -> bool {
    gid % 2 == 0
}

/// One game in the bracket. Participants start as `None` and are filled in by
/// seeding or by propagation from the child games; the winner is set exactly
/// once, when the real-world result arrives.
#[derive(Clone, Copy, Debug)]
pub struct Game {
    pub gid: u32,
    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,
    pub winner: Option<TeamId>,
}

impl Game {
    pub fn new(gid: u32) -> Self {
        Game {
            gid,
            team1: None,
            team2: None,
            winner: None,
        }
    }

    pub fn round(&self) -> usize {
        round(self.gid)
    }

    pub fn points(&self) -> u32 {
        points(self.gid)
    }

    /// Both participants, once known.
    pub fn matchup(&self) -> Option<(TeamId, TeamId)> {
        Some((self.team1?, self.team2?))
    }

    pub fn has_participant(&self, team: TeamId) -> bool {
        self.team1 == Some(team) || self.team2 == Some(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_landmarks() {
        assert_eq!(round(1), 6);
        assert_eq!(round(2), 5);
        assert_eq!(round(3), 5);
        assert_eq!(round(8), 3);
        assert_eq!(round(32), 1);
        assert_eq!(round(63), 1);
        assert_eq!(round(64), 0);
        assert_eq!(round(127), 0);
    }

    #[test]
    fn test_region_bands() {
        // Round 1: eight games per region, in ID order.
        assert_eq!(region(32), 1);
        assert_eq!(region(39), 1);
        assert_eq!(region(40), 2);
        assert_eq!(region(63), 4);
        // Round 4: one game per region.
        assert_eq!(region(4), 1);
        assert_eq!(region(7), 4);
        // No region past the regionals or before the main draw.
        assert_eq!(region(1), 0);
        assert_eq!(region(2), 0);
        assert_eq!(region(64), 0);
    }

    #[test]
    fn test_points_by_round() {
        assert_eq!(points(1), 13);
        assert_eq!(points(2), 8);
        assert_eq!(points(5), 5);
        assert_eq!(points(33), 1);
        assert_eq!(points(65), 1);
    }

    #[test]
    fn test_parent_child_links() {
        assert_eq!(parent(1), None);
        assert_eq!(parent(7), Some(3));
        assert_eq!(children(3), (6, 7));
        assert!(feeds_team1(6));
        assert!(!feeds_team1(7));
    }

    #[test]
    fn test_matchup_requires_both_sides() {
        let mut game = Game::new(33);
        assert!(game.matchup().is_none());
        game.team1 = Some(TeamId(0));
        assert!(game.matchup().is_none());
        assert!(game.has_participant(TeamId(0)));
        game.team2 = Some(TeamId(7));
        assert_eq!(game.matchup(), Some((TeamId(0), TeamId(7))));
        assert!(!game.has_participant(TeamId(3)));
    }

    #[test]
    fn test_full_bracket_point_total() {
        // Regression constant for the 64-team draw plus First Four:
        // [1,1,2,3,5,8,13] x [4,32,16,8,4,2,1] games per round.
        let main: u32 = (1..=63).map(points).sum();
        let first_four = 4 * points(64);
        assert_eq!(main + first_four, 141);
    }

    proptest! {
        #[test]
        fn prop_round_constant_within_bit_band(gid in 1u32..=127) {
            // Every ID with the same bit length shares a round, and the next
            // band down is exactly one round earlier.
            let band_lo = 1u32 << (u32::BITS - gid.leading_zeros() - 1);
            prop_assert_eq!(round(gid), round(band_lo));
            if band_lo > 1 {
                prop_assert_eq!(round(gid) + 1, round(band_lo / 2));
            }
        }

        #[test]
        fn prop_children_point_back(gid in 1u32..=63) {
            let (c1, c2) = children(gid);
            prop_assert_eq!(parent(c1), Some(gid));
            prop_assert_eq!(parent(c2), Some(gid));
            prop_assert!(feeds_team1(c1));
            prop_assert!(!feeds_team1(c2));
        }

        #[test]
        fn prop_region_in_range(gid in 1u32..=127) {
            let rgn = region(gid);
            prop_assert!(rgn <= 4);
            let rd = round(gid);
            if (1..=4).contains(&rd) {
                prop_assert!((1..=4).contains(&rgn));
            } else {
                prop_assert_eq!(rgn, 0);
            }
        }
    }
}
