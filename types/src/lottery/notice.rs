use crate::Participant;
use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_utils::hex;

use super::{Odds, MINUTE_CADENCE_ABOVE_SECS};

/// Message emitted by the round controller.
///
/// Notices are structured so that a notifier can choose its own transport.
/// [Notice::render] produces the chat text used by the default notifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    RoundStarted {
        round: u64,
        countdown: u64,
    },
    Countdown {
        round: u64,
        remaining: u64,
    },
    EntryAccepted {
        participant: Participant,
        stake: u64,
        odds: Odds,
    },
    PotUpdated {
        round: u64,
        total: u64,
        participants: usize,
    },
    Won {
        round: u64,
        participant: Participant,
        amount: u64,
        odds: Odds,
    },
    Undeliverable {
        round: u64,
        participant: Participant,
        amount: u64,
        odds: Odds,
    },
    NoParticipants {
        round: u64,
    },
}

impl Notice {
    /// Render the notice as chat text.
    pub fn render(&self, prefix: &str, resource: &str) -> String {
        let body = match self {
            Self::RoundStarted { countdown, .. } => format!(
                "A new gambling round has started! Use /gamble <amount> to join. Winner will be chosen in {}.",
                format_duration(*countdown)
            ),
            Self::Countdown { remaining, .. } => {
                let remaining = if *remaining > MINUTE_CADENCE_ABOVE_SECS {
                    format_duration(*remaining)
                } else {
                    format_seconds(*remaining)
                };
                format!("Gamble ends in {remaining}! Use /gamble <amount> to join!")
            }
            Self::EntryAccepted { stake, odds, .. } => format!(
                "You have entered the gamble with {stake} {resource}. Your current chance of winning: {odds}"
            ),
            Self::PotUpdated {
                total,
                participants,
                ..
            } => format!(
                "The pot is now {total} {resource} across {participants} {}.",
                if *participants == 1 {
                    "participant"
                } else {
                    "participants"
                }
            ),
            Self::Won {
                participant,
                amount,
                odds,
                ..
            } => format!(
                "The winner of the gamble is {}, winning {amount} {resource}! They had a {odds} chance to win.",
                display_participant(participant)
            ),
            Self::Undeliverable {
                participant, odds, ..
            } => format!(
                "The winner (ID: {}) is offline. Winnings could not be delivered. They had a {odds} chance to win.",
                display_participant(participant)
            ),
            Self::NoParticipants { .. } => {
                "No participants joined the gamble. No winner this round.".to_string()
            }
        };
        format!("{prefix} {body}")
    }
}

impl Write for Notice {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::RoundStarted { round, countdown } => {
                0u8.write(writer);
                round.write(writer);
                countdown.write(writer);
            }
            Self::Countdown { round, remaining } => {
                1u8.write(writer);
                round.write(writer);
                remaining.write(writer);
            }
            Self::EntryAccepted {
                participant,
                stake,
                odds,
            } => {
                2u8.write(writer);
                participant.write(writer);
                stake.write(writer);
                odds.write(writer);
            }
            Self::PotUpdated {
                round,
                total,
                participants,
            } => {
                3u8.write(writer);
                round.write(writer);
                total.write(writer);
                (*participants as u64).write(writer);
            }
            Self::Won {
                round,
                participant,
                amount,
                odds,
            } => {
                4u8.write(writer);
                round.write(writer);
                participant.write(writer);
                amount.write(writer);
                odds.write(writer);
            }
            Self::Undeliverable {
                round,
                participant,
                amount,
                odds,
            } => {
                5u8.write(writer);
                round.write(writer);
                participant.write(writer);
                amount.write(writer);
                odds.write(writer);
            }
            Self::NoParticipants { round } => {
                6u8.write(writer);
                round.write(writer);
            }
        }
    }
}

impl Read for Notice {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let notice = match u8::read(reader)? {
            0 => Self::RoundStarted {
                round: u64::read(reader)?,
                countdown: u64::read(reader)?,
            },
            1 => Self::Countdown {
                round: u64::read(reader)?,
                remaining: u64::read(reader)?,
            },
            2 => Self::EntryAccepted {
                participant: Participant::read(reader)?,
                stake: u64::read(reader)?,
                odds: Odds::read(reader)?,
            },
            3 => {
                let round = u64::read(reader)?;
                let total = u64::read(reader)?;
                let participants = usize::try_from(u64::read(reader)?)
                    .map_err(|_| Error::Invalid("Notice", "participant count too large"))?;
                Self::PotUpdated {
                    round,
                    total,
                    participants,
                }
            }
            4 => Self::Won {
                round: u64::read(reader)?,
                participant: Participant::read(reader)?,
                amount: u64::read(reader)?,
                odds: Odds::read(reader)?,
            },
            5 => Self::Undeliverable {
                round: u64::read(reader)?,
                participant: Participant::read(reader)?,
                amount: u64::read(reader)?,
                odds: Odds::read(reader)?,
            },
            6 => Self::NoParticipants {
                round: u64::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(notice)
    }
}

impl EncodeSize for Notice {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::RoundStarted { .. } | Self::Countdown { .. } => u64::SIZE * 2,
                Self::EntryAccepted { .. } => Participant::SIZE + u64::SIZE + Odds::SIZE,
                Self::PotUpdated { .. } => u64::SIZE * 3,
                Self::Won { .. } | Self::Undeliverable { .. } => {
                    u64::SIZE + Participant::SIZE + u64::SIZE + Odds::SIZE
                }
                Self::NoParticipants { .. } => u64::SIZE,
            }
    }
}

/// Hex encoding of a participant identity.
pub fn display_participant(participant: &Participant) -> String {
    hex(&participant.encode())
}

/// Format a number of seconds, using whole minutes from one minute up.
pub fn format_duration(seconds: u64) -> String {
    if seconds >= 60 {
        let minutes = seconds / 60;
        return format!("{minutes} {}", if minutes > 1 { "minutes" } else { "minute" });
    }
    format_seconds(seconds)
}

fn format_seconds(seconds: u64) -> String {
    format!("{seconds} {}", if seconds == 1 { "second" } else { "seconds" })
}
