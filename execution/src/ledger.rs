use stakepot_types::Participant;
use std::{
    collections::{HashMap, HashSet},
    future::Future,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DebitError {
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CreditError {
    #[error("participant cannot receive funds")]
    Undeliverable,
}

/// Balances of the stake resource.
///
/// A debit either removes the full amount or fails without side effects.
/// A failed credit is terminal: callers do not retry.
pub trait Ledger {
    fn debit(
        &mut self,
        participant: &Participant,
        amount: u64,
    ) -> impl Future<Output = Result<(), DebitError>>;

    fn credit(
        &mut self,
        participant: &Participant,
        amount: u64,
    ) -> impl Future<Output = Result<(), CreditError>>;
}

/// In-memory ledger.
///
/// Participants seen for the first time start with the configured grant.
/// Participants marked offline cannot be credited.
#[derive(Default)]
pub struct Memory {
    balances: HashMap<Participant, u64>,
    offline: HashSet<Participant>,
    grant: u64,
}

impl Memory {
    pub fn new(grant: u64) -> Self {
        Self {
            grant,
            ..Default::default()
        }
    }

    pub fn balance(&self, participant: &Participant) -> u64 {
        self.balances
            .get(participant)
            .copied()
            .unwrap_or(self.grant)
    }

    pub fn deposit(&mut self, participant: &Participant, amount: u64) {
        let balance = self.account(participant);
        *balance = balance.saturating_add(amount);
    }

    pub fn set_online(&mut self, participant: &Participant, online: bool) {
        if online {
            self.offline.remove(participant);
        } else {
            self.offline.insert(participant.clone());
        }
    }

    pub fn is_online(&self, participant: &Participant) -> bool {
        !self.offline.contains(participant)
    }

    fn account(&mut self, participant: &Participant) -> &mut u64 {
        self.balances
            .entry(participant.clone())
            .or_insert(self.grant)
    }
}

impl Ledger for Memory {
    async fn debit(&mut self, participant: &Participant, amount: u64) -> Result<(), DebitError> {
        let balance = self.account(participant);
        if *balance < amount {
            return Err(DebitError::InsufficientBalance {
                requested: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    async fn credit(&mut self, participant: &Participant, amount: u64) -> Result<(), CreditError> {
        if !self.is_online(participant) {
            return Err(CreditError::Undeliverable);
        }
        let balance = self.account(participant);
        *balance = balance
            .checked_add(amount)
            .ok_or(CreditError::Undeliverable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;
    use commonware_runtime::{deterministic::Runner, Runner as _};

    #[test]
    fn test_debit_is_all_or_nothing() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let (_, public) = create_account_keypair(1);
            let mut ledger = Memory::new(50);

            assert_eq!(
                ledger.debit(&public, 80).await,
                Err(DebitError::InsufficientBalance {
                    requested: 80,
                    available: 50
                })
            );
            assert_eq!(ledger.balance(&public), 50);

            ledger.debit(&public, 50).await.unwrap();
            assert_eq!(ledger.balance(&public), 0);
        });
    }

    #[test]
    fn test_credit_offline_is_undeliverable() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let (_, public) = create_account_keypair(1);
            let mut ledger = Memory::default();

            ledger.set_online(&public, false);
            assert_eq!(
                ledger.credit(&public, 10).await,
                Err(CreditError::Undeliverable)
            );
            assert_eq!(ledger.balance(&public), 0);

            ledger.set_online(&public, true);
            ledger.credit(&public, 10).await.unwrap();
            assert_eq!(ledger.balance(&public), 10);
        });
    }

    #[test]
    fn test_deposit_adds_to_grant() {
        let (_, public) = create_account_keypair(1);
        let mut ledger = Memory::new(100);
        ledger.deposit(&public, 25);
        assert_eq!(ledger.balance(&public), 125);
    }
}
