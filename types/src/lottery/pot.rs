use crate::Participant;
use std::collections::HashMap;
use thiserror::Error;

use super::Odds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PotError {
    #[error("pot is not accepting entries")]
    InvalidState,
    #[error("participant already entered this round")]
    DuplicateParticipant,
    #[error("stake must be positive and fit in the pot")]
    InvalidStake,
}

/// Stakes contributed to the active round.
///
/// Entries are kept in insertion order, which is the iteration order used by
/// the selector. The total is maintained as entries are added.
#[derive(Clone, Debug, Default)]
pub struct Pot {
    entries: HashMap<Participant, u64>,
    order: Vec<Participant>,
    total: u64,
    accepting: bool,
}

impl Pot {
    /// Clear all entries and start accepting new ones.
    pub fn open(&mut self) {
        self.reset();
        self.accepting = true;
    }

    /// Stop accepting entries. Existing entries are kept for settlement.
    pub fn seal(&mut self) {
        self.accepting = false;
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Record a stake for a participant that has not yet entered.
    pub fn add_entry(&mut self, participant: Participant, stake: u64) -> Result<(), PotError> {
        if !self.accepting {
            return Err(PotError::InvalidState);
        }
        if self.entries.contains_key(&participant) {
            return Err(PotError::DuplicateParticipant);
        }
        if stake == 0 {
            return Err(PotError::InvalidStake);
        }
        let total = self.total.checked_add(stake).ok_or(PotError::InvalidStake)?;

        self.entries.insert(participant.clone(), stake);
        self.order.push(participant);
        self.total = total;
        Ok(())
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Stake contributed by a participant, if they entered.
    pub fn share(&self, participant: &Participant) -> Option<u64> {
        self.entries.get(participant).copied()
    }

    /// Odds of a participant winning the pot as it stands now.
    pub fn odds(&self, participant: &Participant) -> Option<Odds> {
        self.share(participant)
            .map(|stake| Odds::new(stake, self.total))
    }

    pub fn contains(&self, participant: &Participant) -> bool {
        self.entries.contains_key(participant)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = (&Participant, u64)> + '_ {
        self.order
            .iter()
            .filter_map(|participant| self.entries.get(participant).map(|s| (participant, *s)))
    }

    /// Last participant to enter.
    pub fn last(&self) -> Option<&Participant> {
        self.order.last()
    }

    /// Drop all entries and stop accepting new ones.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total = 0;
        self.accepting = false;
    }
}
