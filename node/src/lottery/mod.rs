mod actor;
mod ingress;
mod notifier;
mod scheduler;

pub use actor::Actor;
pub use ingress::{Mailbox, MailboxError, Message, Status};
pub use notifier::LogNotifier;
pub use scheduler::{Cancel, Timers};

/// Configuration for the lottery [Actor].
pub struct Config {
    /// Round settings passed to the controller.
    pub round: stakepot_execution::Config,

    /// Balance granted to participants the ledger has not seen before.
    pub starting_balance: u64,

    /// Number of messages to hold in the mailbox before blocking.
    pub mailbox_size: usize,
}
