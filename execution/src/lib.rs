pub mod ledger;
pub mod round;
pub mod schedule;
pub mod selector;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use ledger::{CreditError, DebitError, Ledger, Memory};
pub use round::{Config, Controller, Notifier, Outcome, RoundError, TICK_INTERVAL};
pub use schedule::{Scheduler, Subscription, Timer};
pub use selector::SelectError;
