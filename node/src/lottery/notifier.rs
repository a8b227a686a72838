use stakepot_execution::Notifier;
use stakepot_types::{
    lottery::{display_participant, Notice},
    Participant,
};
use tracing::info;

/// Notifier that writes rendered chat messages to the log.
pub struct LogNotifier {
    prefix: String,
    resource: String,
}

impl LogNotifier {
    pub fn new(prefix: String, resource: String) -> Self {
        Self { prefix, resource }
    }
}

impl Notifier for LogNotifier {
    fn broadcast(&mut self, notice: &Notice) {
        info!(message = %notice.render(&self.prefix, &self.resource), "broadcast");
    }

    fn direct(&mut self, participant: &Participant, notice: &Notice) {
        info!(
            participant = %display_participant(participant),
            message = %notice.render(&self.prefix, &self.resource),
            "direct"
        );
    }
}
