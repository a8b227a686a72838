use super::*;
use crate::{
    ledger::Memory,
    mocks::{
        create_account_keypair, create_config, ManualScheduler, RecordingLedger,
        RecordingNotifier, Timers,
    },
};
use commonware_runtime::{deterministic::Runner, Runner as _};
use rand::{rngs::StdRng, SeedableRng};
use std::{cell::RefCell, rc::Rc};

type TestController = Controller<RecordingLedger, RecordingNotifier, ManualScheduler, StdRng>;

fn setup_with(config: Config, grant: u64) -> (TestController, Rc<RefCell<Timers>>) {
    let scheduler = ManualScheduler::default();
    let timers = scheduler.timers();
    let ledger = RecordingLedger::new(Memory::new(grant)).observe(&scheduler);
    let controller = Controller::new(
        config,
        ledger,
        RecordingNotifier::default(),
        scheduler,
        StdRng::seed_from_u64(0),
    );
    (controller, timers)
}

fn setup(countdown: u64, grant: u64) -> (TestController, Rc<RefCell<Timers>>) {
    setup_with(create_config(countdown), grant)
}

async fn run_out(controller: &mut TestController) -> Option<Outcome> {
    let round = controller.round();
    for _ in 0..controller.time_remaining() {
        if let Some(outcome) = controller.tick(round).await {
            return Some(outcome);
        }
    }
    None
}

#[test]
fn test_countdown_due() {
    let due: Vec<u64> = (0..=125).rev().filter(|r| countdown_due(*r)).collect();
    assert_eq!(
        due,
        vec![120, 60, 50, 40, 30, 20, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1]
    );
}

#[test]
fn test_start_opens_round() {
    let (mut controller, timers) = setup(600, 0);
    let (_, initiator) = create_account_keypair(1);

    assert_eq!(controller.phase(), Phase::Idle);
    assert_eq!(controller.request_start(Some(&initiator)), Ok(1));
    assert_eq!(controller.phase(), Phase::Open);
    assert_eq!(controller.time_remaining(), 600);
    assert!(controller.pot().is_empty());
    assert_eq!(timers.borrow().active(), vec![Timer::Tick { round: 1 }]);
    assert_eq!(
        controller.notifier().broadcasts,
        vec![Notice::RoundStarted {
            round: 1,
            countdown: 600
        }]
    );

    // A second start is rejected and leaves the round alone
    assert_eq!(
        controller.request_start(None),
        Err(RoundError::AlreadyRunning)
    );
    assert_eq!(controller.round(), 1);
    assert_eq!(timers.borrow().ticks(), 1);
}

#[test]
fn test_entries_accumulate() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(600, 1_000);
        controller.request_start(None).unwrap();

        let stakes = [(1, 15), (2, 100), (3, 1), (4, 84)];
        for (seed, stake) in stakes {
            let (_, participant) = create_account_keypair(seed);
            controller.request_entry(participant, stake).await.unwrap();
        }

        assert_eq!(controller.pot().total(), 200);
        assert_eq!(controller.pot().len(), 4);
        assert_eq!(controller.ledger().debits.len(), 4);
        for (seed, stake) in stakes {
            let (_, participant) = create_account_keypair(seed);
            assert_eq!(controller.ledger().inner.balance(&participant), 1_000 - stake);
            assert_eq!(controller.pot().share(&participant), Some(stake));
        }
    });
}

#[test]
fn test_entry_reports_odds() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(600, 100);
        let (_, p1) = create_account_keypair(1);
        let (_, p2) = create_account_keypair(2);
        controller.request_start(None).unwrap();

        let odds = controller.request_entry(p1.clone(), 40).await.unwrap();
        assert_eq!(odds.percent(), 100.0);
        let odds = controller.request_entry(p2.clone(), 60).await.unwrap();
        assert_eq!(odds.percent(), 60.0);
        assert_eq!(controller.pot().odds(&p1).unwrap().percent(), 40.0);

        let directs = &controller.notifier().directs;
        assert_eq!(directs.len(), 2);
        assert_eq!(
            directs[1],
            (
                p2.clone(),
                Notice::EntryAccepted {
                    participant: p2,
                    stake: 60,
                    odds: Odds::new(60, 100),
                }
            )
        );
        assert_eq!(
            controller.notifier().broadcasts.last(),
            Some(&Notice::PotUpdated {
                round: 1,
                total: 100,
                participants: 2
            })
        );
    });
}

#[test]
fn test_duplicate_entry_rejected() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(600, 100);
        let (_, participant) = create_account_keypair(1);
        controller.request_start(None).unwrap();
        controller
            .request_entry(participant.clone(), 30)
            .await
            .unwrap();

        assert_eq!(
            controller.request_entry(participant.clone(), 20).await,
            Err(RoundError::AlreadyEntered)
        );
        assert_eq!(controller.pot().total(), 30);
        assert_eq!(controller.pot().len(), 1);
        assert_eq!(controller.ledger().debits.len(), 1);
        assert_eq!(controller.ledger().inner.balance(&participant), 70);
    });
}

#[test]
fn test_entry_requires_open_round() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(1, 100);
        let (_, participant) = create_account_keypair(1);

        // Before any round
        assert_eq!(
            controller.request_entry(participant.clone(), 10).await,
            Err(RoundError::RoundNotOpen)
        );

        // After a round has closed
        controller.request_start(None).unwrap();
        run_out(&mut controller).await.unwrap();
        assert_eq!(
            controller.request_entry(participant.clone(), 10).await,
            Err(RoundError::RoundNotOpen)
        );

        assert!(controller.pot().is_empty());
        assert!(controller.ledger().debits.is_empty());
        assert_eq!(controller.ledger().inner.balance(&participant), 100);
    });
}

#[test]
fn test_insufficient_balance_leaves_pot_untouched() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(600, 25);
        let (_, participant) = create_account_keypair(1);
        controller.request_start(None).unwrap();
        let broadcasts = controller.notifier().broadcasts.len();

        assert_eq!(
            controller.request_entry(participant.clone(), 26).await,
            Err(RoundError::InsufficientBalance {
                requested: 26,
                available: 25
            })
        );
        assert!(controller.pot().is_empty());
        assert!(controller.notifier().directs.is_empty());
        assert_eq!(controller.notifier().broadcasts.len(), broadcasts);
        assert_eq!(controller.ledger().inner.balance(&participant), 25);

        // The participant can still enter with what they have
        controller.request_entry(participant, 25).await.unwrap();
        assert_eq!(controller.pot().total(), 25);
    });
}

#[test]
fn test_zero_stake_rejected() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(600, 25);
        let (_, participant) = create_account_keypair(1);
        controller.request_start(None).unwrap();

        assert_eq!(
            controller.request_entry(participant, 0).await,
            Err(RoundError::InvalidStake)
        );
        assert!(controller.ledger().debits.is_empty());
        assert!(controller.pot().is_empty());
    });
}

#[test]
fn test_empty_round_closes_without_payout() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, timers) = setup(30, 100);
        controller.request_start(None).unwrap();

        let outcome = run_out(&mut controller).await;
        assert_eq!(outcome, Some(Outcome::NoParticipants { round: 1 }));
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.time_remaining(), 0);
        assert_eq!(
            controller
                .notifier()
                .count(|notice| matches!(notice, Notice::NoParticipants { .. })),
            1
        );
        assert!(controller.ledger().credits.is_empty());
        assert_eq!(timers.borrow().ticks(), 0);
        assert_eq!(timers.borrow().cancelled(), &[Timer::Tick { round: 1 }]);
    });
}

#[test]
fn test_full_round() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, timers) = setup(600, 100);
        let (_, p1) = create_account_keypair(1);
        let (_, p2) = create_account_keypair(2);

        controller.request_start(None).unwrap();
        controller.request_entry(p1.clone(), 40).await.unwrap();
        controller.request_entry(p2.clone(), 60).await.unwrap();
        assert_eq!(controller.pot().odds(&p1).unwrap().percent(), 40.0);
        assert_eq!(controller.pot().odds(&p2).unwrap().percent(), 60.0);

        // Nothing settles before the last tick
        for _ in 0..599 {
            assert_eq!(controller.tick(1).await, None);
        }
        assert_eq!(controller.time_remaining(), 1);
        assert_eq!(controller.phase(), Phase::Open);

        let Some(Outcome::Paid {
            round,
            winner,
            amount,
        }) = controller.tick(1).await
        else {
            panic!("round should pay out");
        };
        assert_eq!(round, 1);
        assert_eq!(amount, 100);
        assert!(winner == p1 || winner == p2);

        // Exactly one credit, made after the tick was cancelled
        let credits = &controller.ledger().credits;
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].participant, winner);
        assert_eq!(credits[0].amount, 100);
        assert!(credits[0].delivered);
        assert_eq!(credits[0].live_ticks, 0);
        assert_eq!(timers.borrow().ticks(), 0);

        let stake = if winner == p1 { 40 } else { 60 };
        assert_eq!(controller.ledger().inner.balance(&winner), 100 - stake + 100);

        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.pot().is_empty());
        assert_eq!(controller.pot().total(), 0);
        assert_eq!(
            controller
                .notifier()
                .count(|notice| matches!(notice, Notice::Won { .. })),
            1
        );
    });
}

#[test]
fn test_undeliverable_payout_still_resets() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(5, 100);
        let (_, participant) = create_account_keypair(1);
        controller.ledger_mut().inner.set_online(&participant, false);

        controller.request_start(None).unwrap();
        controller
            .request_entry(participant.clone(), 50)
            .await
            .unwrap();

        let outcome = run_out(&mut controller).await;
        assert_eq!(
            outcome,
            Some(Outcome::Undelivered {
                round: 1,
                winner: participant.clone(),
                amount: 50
            })
        );
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.pot().is_empty());
        assert_eq!(controller.ledger().inner.balance(&participant), 50);
        assert_eq!(
            controller.notifier().broadcasts.last(),
            Some(&Notice::Undeliverable {
                round: 1,
                participant,
                amount: 50,
                odds: Odds::new(50, 50),
            })
        );

        // The next round starts normally
        assert_eq!(controller.request_start(None), Ok(2));
    });
}

#[test]
fn test_auto_start_check() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(600, 100);
        let (_, participant) = create_account_keypair(1);

        assert_eq!(controller.auto_start_check(), Some(1));
        controller.request_entry(participant, 10).await.unwrap();
        controller.tick(1).await;
        let broadcasts = controller.notifier().broadcasts.len();

        // Already open: nothing changes
        assert_eq!(controller.auto_start_check(), None);
        assert_eq!(controller.round(), 1);
        assert_eq!(controller.time_remaining(), 599);
        assert_eq!(controller.pot().total(), 10);
        assert_eq!(controller.pot().len(), 1);
        assert_eq!(controller.notifier().broadcasts.len(), broadcasts);
    });
}

#[test]
fn test_stale_tick_ignored() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, timers) = setup(2, 100);

        // Ticks while idle are ignored
        assert_eq!(controller.tick(0).await, None);

        controller.request_start(None).unwrap();
        run_out(&mut controller).await.unwrap();
        controller.request_start(None).unwrap();
        assert_eq!(timers.borrow().active(), vec![Timer::Tick { round: 2 }]);

        // A late tick from the first round does not advance the second
        assert_eq!(controller.tick(1).await, None);
        assert_eq!(controller.time_remaining(), 2);
        assert_eq!(controller.tick(2).await, None);
        assert_eq!(controller.time_remaining(), 1);
    });
}

#[test]
fn test_countdown_announcements() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let (mut controller, _) = setup(125, 100);
        controller.request_start(None).unwrap();
        run_out(&mut controller).await.unwrap();

        let announced: Vec<u64> = controller
            .notifier()
            .broadcasts
            .iter()
            .filter_map(|notice| match notice {
                Notice::Countdown { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(
            announced,
            vec![120, 60, 50, 40, 30, 20, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1]
        );
    });
}

#[test]
fn test_broadcast_disabled_only_logs() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut config = create_config(3);
        config.broadcast_to_all = false;
        let (mut controller, _) = setup_with(config, 100);
        let (_, participant) = create_account_keypair(1);

        controller.request_start(None).unwrap();
        controller
            .request_entry(participant.clone(), 10)
            .await
            .unwrap();
        run_out(&mut controller).await.unwrap();

        assert!(controller.notifier().broadcasts.is_empty());
        assert_eq!(controller.notifier().directs.len(), 1);
        assert_eq!(controller.ledger().inner.balance(&participant), 100);
    });
}

#[test]
fn test_init_and_shutdown_manage_timers() {
    let (mut controller, timers) = setup(600, 0);

    controller.init();
    assert_eq!(timers.borrow().active(), vec![Timer::AutoStart]);

    // Re-initializing replaces the subscription
    controller.init();
    assert_eq!(timers.borrow().active(), vec![Timer::AutoStart]);

    controller.request_start(None).unwrap();
    assert_eq!(timers.borrow().active().len(), 2);

    controller.shutdown();
    assert!(timers.borrow().active().is_empty());
}
