//! Stake-weighted winner selection.
//!
//! A roll is drawn uniformly from `[1, total]` and entries are walked in
//! insertion order, accumulating stakes. The first participant whose
//! cumulative stake reaches the roll wins, so each participant wins with
//! probability `stake / total`.

use rand::Rng;
use stakepot_types::{lottery::Pot, Participant};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("no participants in pot")]
    EmptyPot,
}

/// Draw a winner from the pot.
pub fn draw<'a, R: Rng>(pot: &'a Pot, rng: &mut R) -> Result<&'a Participant, SelectError> {
    if pot.is_empty() || pot.total() == 0 {
        return Err(SelectError::EmptyPot);
    }
    let roll = rng.gen_range(1..=pot.total());
    pick(pot, roll).ok_or(SelectError::EmptyPot)
}

/// Walk the pot for a given roll in `[1, total]`.
///
/// Rolls past the total resolve to the last entrant.
pub fn pick(pot: &Pot, roll: u64) -> Option<&Participant> {
    let mut cumulative = 0u64;
    for (participant, stake) in pot.iter() {
        cumulative = cumulative.saturating_add(stake);
        if roll <= cumulative {
            return Some(participant);
        }
    }
    pot.last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;

    fn weighted_pot() -> (Pot, [Participant; 3]) {
        let (_, a) = create_account_keypair(1);
        let (_, b) = create_account_keypair(2);
        let (_, c) = create_account_keypair(3);
        let mut pot = Pot::default();
        pot.open();
        pot.add_entry(a.clone(), 10).unwrap();
        pot.add_entry(b.clone(), 30).unwrap();
        pot.add_entry(c.clone(), 60).unwrap();
        (pot, [a, b, c])
    }

    #[test]
    fn test_pick_boundaries() {
        let (pot, [a, b, c]) = weighted_pot();

        for (roll, expected) in [(1, &a), (10, &a), (11, &b), (40, &b), (41, &c), (100, &c)] {
            assert_eq!(pick(&pot, roll), Some(expected), "roll {roll}");
        }
    }

    #[test]
    fn test_pick_past_total_falls_back_to_last() {
        let (pot, [_, _, c]) = weighted_pot();
        assert_eq!(pick(&pot, 101), Some(&c));
    }

    #[test]
    fn test_draw_empty_pot() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut pot = Pot::default();
        assert_eq!(draw(&pot, &mut rng), Err(SelectError::EmptyPot));

        pot.open();
        assert_eq!(draw(&pot, &mut rng), Err(SelectError::EmptyPot));
    }

    #[test]
    fn test_draw_single_participant_always_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        let (_, a) = create_account_keypair(1);
        let mut pot = Pot::default();
        pot.open();
        pot.add_entry(a.clone(), 1).unwrap();

        for _ in 0..100 {
            assert_eq!(draw(&pot, &mut rng), Ok(&a));
        }
    }

    #[test]
    fn test_draw_is_weighted_by_stake() {
        let mut rng = StdRng::seed_from_u64(42);
        let (pot, [a, b, c]) = weighted_pot();

        const DRAWS: usize = 100_000;
        let mut wins: HashMap<Participant, usize> = HashMap::new();
        for _ in 0..DRAWS {
            let winner = draw(&pot, &mut rng).unwrap();
            *wins.entry(winner.clone()).or_default() += 1;
        }

        for (participant, expected) in [(a, 0.10), (b, 0.30), (c, 0.60)] {
            let frequency = wins[&participant] as f64 / DRAWS as f64;
            assert!(
                (frequency - expected).abs() < 0.01,
                "frequency {frequency} too far from {expected}"
            );
        }
    }
}
