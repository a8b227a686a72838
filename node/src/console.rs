//! Line-oriented console used to drive rounds by hand.
//!
//! Participants are named either by a hex-encoded public key or by a numeric
//! seed from which a development key is derived.

use crate::lottery::{Mailbox, MailboxError};
use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};
use stakepot_execution::RoundError;
use stakepot_types::{
    lottery::{display_participant, format_duration},
    parse_participant, Participant,
};
use thiserror::Error;

/// A parsed console command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start { initiator: Option<Participant> },
    Gamble { participant: Participant, amount: u64 },
    Status,
    Balance { participant: Participant },
    Online { participant: Participant },
    Offline { participant: Participant },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Please enter a valid positive amount (got {0}).")]
    InvalidAmount(String),
    #[error("invalid participant: {0}")]
    InvalidParticipant(String),
}

pub const HELP: &str = "commands: start [participant] | gamble <participant> <amount> | status | balance <participant> | online <participant> | offline <participant> | help | quit";

/// Derive the development identity for a numeric seed.
pub fn dev_participant(seed: u64) -> Participant {
    PrivateKey::from_seed(seed).public_key()
}

fn participant(value: &str) -> Result<Participant, CommandError> {
    if let Ok(seed) = value.parse::<u64>() {
        return Ok(dev_participant(seed));
    }
    parse_participant(value).ok_or_else(|| CommandError::InvalidParticipant(value.to_string()))
}

fn amount(value: &str) -> Result<u64, CommandError> {
    match value.parse::<u64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(CommandError::InvalidAmount(value.to_string())),
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = parts.collect();
        let name = name.trim_start_matches('/').to_ascii_lowercase();

        match (name.as_str(), args.as_slice()) {
            ("start", []) => Ok(Self::Start { initiator: None }),
            ("start", [initiator]) => Ok(Self::Start {
                initiator: Some(participant(initiator)?),
            }),
            ("start", _) => Err(CommandError::Usage("start [participant]")),
            ("gamble", [who, value]) => Ok(Self::Gamble {
                participant: participant(who)?,
                amount: amount(value)?,
            }),
            ("gamble", _) => Err(CommandError::Usage("gamble <participant> <amount>")),
            ("status", []) => Ok(Self::Status),
            ("balance", [who]) => Ok(Self::Balance {
                participant: participant(who)?,
            }),
            ("balance", _) => Err(CommandError::Usage("balance <participant>")),
            ("online", [who]) => Ok(Self::Online {
                participant: participant(who)?,
            }),
            ("online", _) => Err(CommandError::Usage("online <participant>")),
            ("offline", [who]) => Ok(Self::Offline {
                participant: participant(who)?,
            }),
            ("offline", _) => Err(CommandError::Usage("offline <participant>")),
            ("help", _) => Ok(Self::Help),
            ("quit" | "exit", _) => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(name)),
        }
    }
}

/// Reply to a rejected round request, in the words shown to participants.
pub fn describe_rejection(err: &RoundError, resource: &str) -> String {
    match err {
        RoundError::AlreadyRunning => "A gamble round is already running.".to_string(),
        RoundError::RoundNotOpen => {
            "No gamble round is open. Wait for the next round to start.".to_string()
        }
        RoundError::AlreadyEntered => "You have already entered this round.".to_string(),
        RoundError::InvalidStake => {
            format!("Please enter a valid positive amount of {resource}.")
        }
        RoundError::InsufficientBalance { .. } => {
            format!("You do not have enough {resource} to join the gamble.")
        }
        RoundError::Pot(err) => format!("Your entry could not be recorded: {err}."),
    }
}

/// Run a command against the lottery actor and describe the result.
///
/// Returns `None` once `quit` has stopped the actor.
pub async fn execute(
    mailbox: &mut Mailbox,
    command: Command,
    resource: &str,
) -> Result<Option<String>, MailboxError> {
    let reply = match command {
        Command::Start { initiator } => match mailbox.start(initiator).await? {
            Ok(round) => format!("Round {round} started."),
            Err(err) => describe_rejection(&err, resource),
        },
        Command::Gamble {
            participant,
            amount,
        } => match mailbox.enter(participant, amount).await? {
            Ok(odds) => format!(
                "Entered with {amount} {resource}. Current chance of winning: {odds}"
            ),
            Err(err) => describe_rejection(&err, resource),
        },
        Command::Status => {
            let status = mailbox.status().await?;
            format!(
                "round {} is {}: {} {resource} from {} participants, {} remaining",
                status.round,
                status.phase,
                status.total,
                status.participants,
                format_duration(status.time_remaining)
            )
        }
        Command::Balance { participant } => {
            let balance = mailbox.balance(participant.clone()).await?;
            format!(
                "{} has {balance} {resource}",
                display_participant(&participant)
            )
        }
        Command::Online { participant } => {
            mailbox.presence(participant, true).await?;
            "Participant is online.".to_string()
        }
        Command::Offline { participant } => {
            mailbox.presence(participant, false).await?;
            "Participant is offline.".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => {
            mailbox.shutdown().await?;
            return Ok(None);
        }
    };
    Ok(Some(reply))
}
