//! Test doubles for the round controller's collaborators.

use crate::{
    ledger::{CreditError, DebitError, Ledger, Memory},
    round::{Config, Notifier},
    schedule::{Scheduler, Subscription, Timer},
};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    PrivateKeyExt, Signer,
};
use rand::{rngs::StdRng, SeedableRng};
use stakepot_types::{lottery::Notice, Participant};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};

/// Creates an account keypair for a participant
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Controller configuration used by tests.
pub fn create_config(countdown: u64) -> Config {
    Config {
        countdown,
        auto_start_interval: Duration::from_secs(3_600),
        resource: "scrap".to_string(),
        broadcast_to_all: true,
        prefix: "[ Gamble ]".to_string(),
    }
}

/// Records every notice instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub broadcasts: Vec<Notice>,
    pub directs: Vec<(Participant, Notice)>,
}

impl RecordingNotifier {
    /// Number of recorded broadcasts matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Notice) -> bool) -> usize {
        self.broadcasts.iter().filter(|notice| predicate(notice)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn broadcast(&mut self, notice: &Notice) {
        self.broadcasts.push(notice.clone());
    }

    fn direct(&mut self, participant: &Participant, notice: &Notice) {
        self.directs.push((participant.clone(), notice.clone()));
    }
}

/// Subscriptions currently installed on a [ManualScheduler].
#[derive(Default)]
pub struct Timers {
    next: u64,
    active: BTreeMap<u64, (Duration, Timer)>,
    cancelled: Vec<Timer>,
}

impl Timers {
    pub fn active(&self) -> Vec<Timer> {
        self.active.values().map(|(_, timer)| *timer).collect()
    }

    pub fn ticks(&self) -> usize {
        self.active
            .values()
            .filter(|(_, timer)| matches!(timer, Timer::Tick { .. }))
            .count()
    }

    pub fn cancelled(&self) -> &[Timer] {
        &self.cancelled
    }
}

/// Scheduler that never fires on its own. Tests drive the controller directly
/// and inspect which subscriptions are live.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Rc<RefCell<Timers>>,
}

impl ManualScheduler {
    pub fn timers(&self) -> Rc<RefCell<Timers>> {
        self.timers.clone()
    }
}

pub struct ManualSubscription {
    id: u64,
    timers: Rc<RefCell<Timers>>,
}

impl Subscription for ManualSubscription {
    fn cancel(self) {
        let mut timers = self.timers.borrow_mut();
        if let Some((_, timer)) = timers.active.remove(&self.id) {
            timers.cancelled.push(timer);
        }
    }
}

impl Scheduler for ManualScheduler {
    type Subscription = ManualSubscription;

    fn every(&mut self, interval: Duration, timer: Timer) -> Self::Subscription {
        let mut timers = self.timers.borrow_mut();
        let id = timers.next;
        timers.next += 1;
        timers.active.insert(id, (interval, timer));
        ManualSubscription {
            id,
            timers: self.timers.clone(),
        }
    }
}

/// A credit observed by a [RecordingLedger].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credit {
    pub participant: Participant,
    pub amount: u64,
    pub delivered: bool,
    /// Tick subscriptions still live when the credit was attempted.
    pub live_ticks: usize,
}

/// [Memory] ledger that records every call.
pub struct RecordingLedger {
    pub inner: Memory,
    pub debits: Vec<(Participant, u64)>,
    pub credits: Vec<Credit>,
    timers: Option<Rc<RefCell<Timers>>>,
}

impl RecordingLedger {
    pub fn new(inner: Memory) -> Self {
        Self {
            inner,
            debits: Vec::new(),
            credits: Vec::new(),
            timers: None,
        }
    }

    /// Record how many ticks are live on `scheduler` whenever a credit happens.
    pub fn observe(mut self, scheduler: &ManualScheduler) -> Self {
        self.timers = Some(scheduler.timers());
        self
    }
}

impl Ledger for RecordingLedger {
    async fn debit(&mut self, participant: &Participant, amount: u64) -> Result<(), DebitError> {
        self.debits.push((participant.clone(), amount));
        self.inner.debit(participant, amount).await
    }

    async fn credit(&mut self, participant: &Participant, amount: u64) -> Result<(), CreditError> {
        let live_ticks = self
            .timers
            .as_ref()
            .map(|timers| timers.borrow().ticks())
            .unwrap_or_default();
        let result = self.inner.credit(participant, amount).await;
        self.credits.push(Credit {
            participant: participant.clone(),
            amount,
            delivered: result.is_ok(),
            live_ticks,
        });
        result
    }
}
