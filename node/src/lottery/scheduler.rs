use super::Mailbox;
use commonware_macros::select;
use commonware_runtime::{Clock, Metrics, Spawner};
use futures::channel::oneshot;
use stakepot_execution::{Scheduler, Subscription, Timer};
use std::time::Duration;
use tracing::debug;

/// Scheduler that runs each subscription as a task posting to the actor mailbox.
pub struct Timers<E: Spawner + Clock + Metrics> {
    context: E,
    mailbox: Mailbox,
}

impl<E: Spawner + Clock + Metrics> Timers<E> {
    pub fn new(context: E, mailbox: Mailbox) -> Self {
        Self { context, mailbox }
    }
}

/// Stops a timer task when cancelled or dropped.
pub struct Cancel {
    sender: oneshot::Sender<()>,
}

impl Subscription for Cancel {
    fn cancel(self) {
        // The task may already have stopped
        let _ = self.sender.send(());
    }
}

impl<E: Spawner + Clock + Metrics> Scheduler for Timers<E> {
    type Subscription = Cancel;

    fn every(&mut self, interval: Duration, timer: Timer) -> Self::Subscription {
        let (sender, mut cancelled) = oneshot::channel::<()>();
        let mut mailbox = self.mailbox.clone();
        self.context
            .with_label("timer")
            .spawn(move |context| async move {
                loop {
                    select! {
                        _ = context.sleep(interval) => {
                            if mailbox.timer(timer).await.is_err() {
                                debug!(?timer, "mailbox closed, stopping timer");
                                return;
                            }
                        },
                        _ = &mut cancelled => {
                            debug!(?timer, "timer cancelled");
                            return;
                        },
                    }
                }
            });
        Cancel { sender }
    }
}
