use std::fmt;

/// Lifecycle phase of the active round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Phase {
    /// No round is running.
    #[default]
    Idle = 0,
    /// Entries are accepted and the countdown is running.
    Open = 1,
    /// The winner is being drawn and paid.
    Settling = 2,
}

impl Phase {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Open => f.write_str("open"),
            Self::Settling => f.write_str("settling"),
        }
    }
}
