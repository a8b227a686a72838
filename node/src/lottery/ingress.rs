use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};
use stakepot_execution::{RoundError, Timer};
use stakepot_types::{
    lottery::{Odds, Phase},
    Participant,
};
use thiserror::Error;

/// Messages sent to the lottery actor.
pub enum Message {
    Start {
        initiator: Option<Participant>,
        response: oneshot::Sender<Result<u64, RoundError>>,
    },
    Enter {
        participant: Participant,
        stake: u64,
        response: oneshot::Sender<Result<Odds, RoundError>>,
    },
    Timer(Timer),
    Status {
        response: oneshot::Sender<Status>,
    },
    Balance {
        participant: Participant,
        response: oneshot::Sender<u64>,
    },
    Presence {
        participant: Participant,
        online: bool,
    },
    Shutdown {
        response: oneshot::Sender<()>,
    },
}

/// Snapshot of the active round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub round: u64,
    pub phase: Phase,
    pub time_remaining: u64,
    pub total: u64,
    pub participants: usize,
}

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("lottery mailbox closed")]
    Closed,
    #[error("lottery request canceled")]
    Canceled,
}

/// Mailbox for the lottery actor.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    async fn send(&mut self, message: Message) -> Result<(), MailboxError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| MailboxError::Closed)
    }

    pub async fn start(
        &mut self,
        initiator: Option<Participant>,
    ) -> Result<Result<u64, RoundError>, MailboxError> {
        let (response, receiver) = oneshot::channel();
        self.send(Message::Start {
            initiator,
            response,
        })
        .await?;
        receiver.await.map_err(|_| MailboxError::Canceled)
    }

    pub async fn enter(
        &mut self,
        participant: Participant,
        stake: u64,
    ) -> Result<Result<Odds, RoundError>, MailboxError> {
        let (response, receiver) = oneshot::channel();
        self.send(Message::Enter {
            participant,
            stake,
            response,
        })
        .await?;
        receiver.await.map_err(|_| MailboxError::Canceled)
    }

    pub async fn status(&mut self) -> Result<Status, MailboxError> {
        let (response, receiver) = oneshot::channel();
        self.send(Message::Status { response }).await?;
        receiver.await.map_err(|_| MailboxError::Canceled)
    }

    pub async fn balance(&mut self, participant: Participant) -> Result<u64, MailboxError> {
        let (response, receiver) = oneshot::channel();
        self.send(Message::Balance {
            participant,
            response,
        })
        .await?;
        receiver.await.map_err(|_| MailboxError::Canceled)
    }

    pub async fn presence(
        &mut self,
        participant: Participant,
        online: bool,
    ) -> Result<(), MailboxError> {
        self.send(Message::Presence {
            participant,
            online,
        })
        .await
    }

    /// Stop the actor once the in-flight message is handled. Timers are
    /// cancelled and later requests fail with [MailboxError::Closed].
    pub async fn shutdown(&mut self) -> Result<(), MailboxError> {
        let (response, receiver) = oneshot::channel();
        self.send(Message::Shutdown { response }).await?;
        receiver.await.map_err(|_| MailboxError::Canceled)
    }

    pub(super) async fn timer(&mut self, timer: Timer) -> Result<(), MailboxError> {
        self.send(Message::Timer(timer)).await
    }
}
