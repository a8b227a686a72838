//! Round lifecycle.
//!
//! The [Controller] owns the single active round and its pot. Rounds move
//! `Idle -> Open -> Settling -> Idle`; a round that closes with no entries goes
//! straight from `Open` back to `Idle`. All methods take `&mut self`, so the
//! host must serialize calls (the node does this with a single actor).

use crate::{
    ledger::{CreditError, DebitError, Ledger},
    schedule::{Scheduler, Subscription, Timer},
    selector,
};
use rand::Rng;
use stakepot_types::{
    lottery::{
        Notice, Odds, Phase, Pot, PotError, FINAL_CADENCE_SECS, MINUTE_CADENCE_ABOVE_SECS,
        SECONDS_CADENCE_STEP,
    },
    Participant,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests;

/// Length of one countdown unit.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Delivers messages to participants.
///
/// Delivery is fire-and-forget: failures are never surfaced to the controller.
pub trait Notifier {
    fn broadcast(&mut self, notice: &Notice);
    fn direct(&mut self, participant: &Participant, notice: &Notice);
}

/// Configuration for the [Controller].
#[derive(Clone, Debug)]
pub struct Config {
    /// Countdown length in ticks.
    pub countdown: u64,

    /// How often to check whether a round should be started automatically.
    pub auto_start_interval: Duration,

    /// Identifier of the stake resource.
    pub resource: String,

    /// Whether broadcasts reach all participants. When unset, broadcasts are
    /// only logged.
    pub broadcast_to_all: bool,

    /// Prefix prepended to every rendered message.
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("a round is already running")]
    AlreadyRunning,
    #[error("no round is open")]
    RoundNotOpen,
    #[error("participant already entered this round")]
    AlreadyEntered,
    #[error("stake must be positive")]
    InvalidStake,
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },
    #[error("pot rejected entry: {0}")]
    Pot(#[from] PotError),
}

impl From<DebitError> for RoundError {
    fn from(err: DebitError) -> Self {
        match err {
            DebitError::InsufficientBalance {
                requested,
                available,
            } => Self::InsufficientBalance {
                requested,
                available,
            },
        }
    }
}

/// How a round was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    NoParticipants {
        round: u64,
    },
    Paid {
        round: u64,
        winner: Participant,
        amount: u64,
    },
    Undelivered {
        round: u64,
        winner: Participant,
        amount: u64,
    },
}

/// Whether a countdown announcement is due with `remaining` ticks left.
///
/// Announces every minute above one minute, every ten seconds down to ten
/// seconds, then every second.
pub fn countdown_due(remaining: u64) -> bool {
    if remaining > MINUTE_CADENCE_ABOVE_SECS {
        return remaining % 60 == 0;
    }
    if remaining > FINAL_CADENCE_SECS {
        return remaining % SECONDS_CADENCE_STEP == 0;
    }
    remaining > 0
}

/// Owner of the active round.
pub struct Controller<L: Ledger, N: Notifier, S: Scheduler, R: Rng> {
    config: Config,
    ledger: L,
    notifier: N,
    scheduler: S,
    rng: R,

    phase: Phase,
    round: u64,
    remaining: u64,
    pot: Pot,

    tick: Option<S::Subscription>,
    auto_start: Option<S::Subscription>,
}

impl<L: Ledger, N: Notifier, S: Scheduler, R: Rng> Controller<L, N, S, R> {
    pub fn new(config: Config, ledger: L, notifier: N, scheduler: S, rng: R) -> Self {
        Self {
            config,
            ledger,
            notifier,
            scheduler,
            rng,
            phase: Phase::Idle,
            round: 0,
            remaining: 0,
            pot: Pot::default(),
            tick: None,
            auto_start: None,
        }
    }

    /// Install the recurring auto-start check.
    pub fn init(&mut self) {
        if let Some(auto_start) = self.auto_start.take() {
            auto_start.cancel();
        }
        self.auto_start = Some(
            self.scheduler
                .every(self.config.auto_start_interval, Timer::AutoStart),
        );
        info!(
            interval = ?self.config.auto_start_interval,
            countdown = self.config.countdown,
            resource = %self.config.resource,
            "round controller initialized"
        );
    }

    /// Cancel all timers.
    pub fn shutdown(&mut self) {
        if let Some(tick) = self.tick.take() {
            tick.cancel();
        }
        if let Some(auto_start) = self.auto_start.take() {
            auto_start.cancel();
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of the current (or most recent) round.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn time_remaining(&self) -> u64 {
        self.remaining
    }

    pub fn pot(&self) -> &Pot {
        &self.pot
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Open a new round.
    ///
    /// Returns the number of the round that was opened.
    pub fn request_start(&mut self, initiator: Option<&Participant>) -> Result<u64, RoundError> {
        if self.phase != Phase::Idle {
            return Err(RoundError::AlreadyRunning);
        }

        self.round += 1;
        self.remaining = self.config.countdown;
        self.pot.open();
        self.phase = Phase::Open;
        if let Some(stale) = self.tick.take() {
            stale.cancel();
        }
        self.tick = Some(self.scheduler.every(
            TICK_INTERVAL,
            Timer::Tick {
                round: self.round,
            },
        ));

        info!(
            round = self.round,
            countdown = self.remaining,
            initiator = ?initiator,
            "round started"
        );
        self.announce(Notice::RoundStarted {
            round: self.round,
            countdown: self.remaining,
        });
        Ok(self.round)
    }

    /// Enter the open round with `stake`.
    ///
    /// The stake is debited from the ledger before the pot is touched, so a
    /// failed debit leaves the round unchanged.
    pub async fn request_entry(
        &mut self,
        participant: Participant,
        stake: u64,
    ) -> Result<Odds, RoundError> {
        if !self.phase.is_open() {
            return Err(RoundError::RoundNotOpen);
        }
        if self.pot.contains(&participant) {
            return Err(RoundError::AlreadyEntered);
        }
        if stake == 0 || self.pot.total().checked_add(stake).is_none() {
            return Err(RoundError::InvalidStake);
        }

        if let Err(err) = self.ledger.debit(&participant, stake).await {
            debug!(?participant, stake, ?err, "entry debit failed");
            return Err(err.into());
        }
        if let Err(err) = self.pot.add_entry(participant.clone(), stake) {
            // Only reachable if the checks above and the pot disagree
            warn!(?participant, stake, ?err, "pot rejected debited entry");
            if let Err(refund) = self.ledger.credit(&participant, stake).await {
                warn!(?participant, stake, ?refund, "failed to return stake");
            }
            return Err(err.into());
        }

        let odds = Odds::new(stake, self.pot.total());
        info!(
            round = self.round,
            ?participant,
            stake,
            total = self.pot.total(),
            participants = self.pot.len(),
            "entry accepted"
        );
        self.notifier.direct(
            &participant,
            &Notice::EntryAccepted {
                participant: participant.clone(),
                stake,
                odds,
            },
        );
        self.announce(Notice::PotUpdated {
            round: self.round,
            total: self.pot.total(),
            participants: self.pot.len(),
        });
        Ok(odds)
    }

    /// Advance the countdown of `round` by one tick.
    ///
    /// Ticks for any round other than the open one are ignored. Returns the
    /// outcome when this tick closed the round.
    pub async fn tick(&mut self, round: u64) -> Option<Outcome> {
        if !self.phase.is_open() || round != self.round {
            debug!(round, current = self.round, phase = %self.phase, "ignoring stale tick");
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            return Some(self.settle().await);
        }
        if countdown_due(self.remaining) {
            self.announce(Notice::Countdown {
                round: self.round,
                remaining: self.remaining,
            });
        }
        None
    }

    /// Start a round if none is running.
    pub fn auto_start_check(&mut self) -> Option<u64> {
        if self.phase != Phase::Idle {
            debug!(round = self.round, phase = %self.phase, "auto-start skipped");
            return None;
        }
        self.request_start(None).ok()
    }

    async fn settle(&mut self) -> Outcome {
        // No tick may arrive once settlement begins
        if let Some(tick) = self.tick.take() {
            tick.cancel();
        }
        self.pot.seal();
        let round = self.round;

        if self.pot.is_empty() {
            return self.close_empty();
        }
        self.phase = Phase::Settling;
        let winner = match selector::draw(&self.pot, &mut self.rng) {
            Ok(winner) => winner.clone(),
            Err(err) => {
                warn!(round, ?err, "draw failed");
                return self.close_empty();
            }
        };
        let amount = self.pot.total();
        let odds = Odds::new(self.pot.share(&winner).unwrap_or_default(), amount);

        let outcome = match self.ledger.credit(&winner, amount).await {
            Ok(()) => {
                info!(round, ?winner, amount, odds = %odds, "round won");
                self.announce(Notice::Won {
                    round,
                    participant: winner.clone(),
                    amount,
                    odds,
                });
                Outcome::Paid {
                    round,
                    winner,
                    amount,
                }
            }
            Err(CreditError::Undeliverable) => {
                warn!(round, ?winner, amount, "winnings undeliverable");
                self.announce(Notice::Undeliverable {
                    round,
                    participant: winner.clone(),
                    amount,
                    odds,
                });
                Outcome::Undelivered {
                    round,
                    winner,
                    amount,
                }
            }
        };
        self.finish();
        outcome
    }

    fn close_empty(&mut self) -> Outcome {
        let round = self.round;
        info!(round, "round closed without participants");
        self.announce(Notice::NoParticipants { round });
        self.finish();
        Outcome::NoParticipants { round }
    }

    fn finish(&mut self) {
        if let Some(tick) = self.tick.take() {
            tick.cancel();
        }
        self.pot.reset();
        self.remaining = 0;
        self.phase = Phase::Idle;
    }

    fn announce(&mut self, notice: Notice) {
        if self.config.broadcast_to_all {
            self.notifier.broadcast(&notice);
            return;
        }
        info!(
            message = %notice.render(&self.config.prefix, &self.config.resource),
            "broadcast"
        );
    }
}
