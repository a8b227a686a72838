use std::time::Duration;

/// Event delivered by a [Scheduler] subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    /// One countdown unit elapsed for the given round.
    Tick { round: u64 },
    /// The auto-start interval elapsed.
    AutoStart,
}

/// A recurring timer that stops firing once cancelled.
pub trait Subscription {
    fn cancel(self);
}

/// Source of recurring timer events.
///
/// Implementations deliver `timer` to the round controller every `interval`
/// until the returned subscription is cancelled. Delivery must be serialized
/// with every other call into the controller.
pub trait Scheduler {
    type Subscription: Subscription;

    fn every(&mut self, interval: Duration, timer: Timer) -> Self::Subscription;
}
