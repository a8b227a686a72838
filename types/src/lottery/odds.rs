use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use std::fmt;

/// Chance of a stake winning the pot it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Odds {
    pub stake: u64,
    pub total: u64,
}

impl Odds {
    pub fn new(stake: u64, total: u64) -> Self {
        Self { stake, total }
    }

    /// Winning chance as a percentage in `[0, 100]`.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.stake as f64 / self.total as f64) * 100.0
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percent())
    }
}

impl Write for Odds {
    fn write(&self, writer: &mut impl BufMut) {
        self.stake.write(writer);
        self.total.write(writer);
    }
}

impl Read for Odds {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let stake = u64::read(reader)?;
        let total = u64::read(reader)?;
        if stake > total {
            return Err(Error::Invalid("Odds", "stake exceeds total"));
        }
        Ok(Self { stake, total })
    }
}

impl FixedSize for Odds {
    const SIZE: usize = u64::SIZE * 2;
}
