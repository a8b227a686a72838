use super::{
    ingress::{Mailbox, Message, Status},
    Config, LogNotifier, Timers,
};
use commonware_runtime::{Clock, Handle, Metrics, Spawner};
use futures::{channel::mpsc, StreamExt};
use prometheus_client::metrics::counter::Counter;
use rand::Rng;
use stakepot_execution::{Controller, Memory, Outcome, Timer};
use std::sync::atomic::AtomicU64;
use tracing::{debug, info, warn};

/// Counters describing round activity.
#[derive(Clone, Default)]
struct Counters {
    rounds_started: Counter<u64, AtomicU64>,
    entries_accepted: Counter<u64, AtomicU64>,
    entries_rejected: Counter<u64, AtomicU64>,
    payouts_delivered: Counter<u64, AtomicU64>,
    payouts_undelivered: Counter<u64, AtomicU64>,
    rounds_empty: Counter<u64, AtomicU64>,
}

/// Lottery actor.
///
/// Owns the round controller and handles one message at a time, so no two
/// round transitions ever interleave.
pub struct Actor<E: Rng + Spawner + Metrics + Clock> {
    context: E,
    mailbox: mpsc::Receiver<Message>,
    controller: Controller<Memory, LogNotifier, Timers<E>, E>,
}

impl<E: Rng + Spawner + Metrics + Clock> Actor<E> {
    /// Create a new lottery actor.
    pub fn new(context: E, config: Config) -> (Self, Mailbox) {
        let (sender, mailbox) = mpsc::channel(config.mailbox_size);
        let inbound = Mailbox::new(sender);

        let scheduler = Timers::new(context.with_label("timers"), inbound.clone());
        let notifier = LogNotifier::new(config.round.prefix.clone(), config.round.resource.clone());
        let ledger = Memory::new(config.starting_balance);
        let controller = Controller::new(
            config.round,
            ledger,
            notifier,
            scheduler,
            context.with_label("draw"),
        );

        (
            Self {
                context,
                mailbox,
                controller,
            },
            inbound,
        )
    }

    pub fn start(mut self) -> Handle<()> {
        self.context.spawn_ref()(self.run())
    }

    /// Run the lottery actor.
    async fn run(mut self) {
        // Initialize metrics
        let counters = Counters::default();
        self.context.register(
            "rounds_started",
            "Number of rounds opened",
            counters.rounds_started.clone(),
        );
        self.context.register(
            "entries_accepted",
            "Number of entries recorded in a pot",
            counters.entries_accepted.clone(),
        );
        self.context.register(
            "entries_rejected",
            "Number of entry requests rejected",
            counters.entries_rejected.clone(),
        );
        self.context.register(
            "payouts_delivered",
            "Number of pots credited to their winner",
            counters.payouts_delivered.clone(),
        );
        self.context.register(
            "payouts_undelivered",
            "Number of pots whose winner could not be credited",
            counters.payouts_undelivered.clone(),
        );
        self.context.register(
            "rounds_empty",
            "Number of rounds closed without participants",
            counters.rounds_empty.clone(),
        );

        // Install the auto-start check
        self.controller.init();

        // Process messages
        let mut stopped = None;
        loop {
            let Some(message) = self.mailbox.next().await else {
                warn!("mailbox closed");
                break;
            };
            match message {
                Message::Start {
                    initiator,
                    response,
                } => {
                    let result = self.controller.request_start(initiator.as_ref());
                    if result.is_ok() {
                        counters.rounds_started.inc();
                    }
                    let _ = response.send(result);
                }
                Message::Enter {
                    participant,
                    stake,
                    response,
                } => {
                    let result = self.controller.request_entry(participant, stake).await;
                    match &result {
                        Ok(_) => counters.entries_accepted.inc(),
                        Err(err) => {
                            debug!(?err, "entry rejected");
                            counters.entries_rejected.inc()
                        }
                    };
                    let _ = response.send(result);
                }
                Message::Timer(Timer::Tick { round }) => {
                    let Some(outcome) = self.controller.tick(round).await else {
                        continue;
                    };
                    match outcome {
                        Outcome::NoParticipants { .. } => counters.rounds_empty.inc(),
                        Outcome::Paid { .. } => counters.payouts_delivered.inc(),
                        Outcome::Undelivered { .. } => counters.payouts_undelivered.inc(),
                    };
                    info!(?outcome, "round settled");
                }
                Message::Timer(Timer::AutoStart) => {
                    if let Some(round) = self.controller.auto_start_check() {
                        counters.rounds_started.inc();
                        info!(round, "round started automatically");
                    }
                }
                Message::Status { response } => {
                    let pot = self.controller.pot();
                    let _ = response.send(Status {
                        round: self.controller.round(),
                        phase: self.controller.phase(),
                        time_remaining: self.controller.time_remaining(),
                        total: pot.total(),
                        participants: pot.len(),
                    });
                }
                Message::Balance {
                    participant,
                    response,
                } => {
                    let _ = response.send(self.controller.ledger().balance(&participant));
                }
                Message::Presence {
                    participant,
                    online,
                } => {
                    self.controller
                        .ledger_mut()
                        .set_online(&participant, online);
                }
                Message::Shutdown { response } => {
                    info!(round = self.controller.round(), "shutdown requested");
                    stopped = Some(response);
                    break;
                }
            }
        }

        self.controller.shutdown();
        if let Some(response) = stopped {
            let _ = response.send(());
        }
    }
}
