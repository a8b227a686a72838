/// Default round countdown in seconds (10 minutes)
pub const DEFAULT_COUNTDOWN_SECS: u64 = 600;

/// Default interval between auto-start checks in seconds (1 hour)
pub const DEFAULT_AUTO_START_SECS: u64 = 3_600;

/// Default stake resource
pub const DEFAULT_RESOURCE: &str = "scrap";

/// Default prefix prepended to every rendered message
pub const DEFAULT_PREFIX: &str = "[ Gamble ]";

/// Maximum length of a stake resource identifier
pub const MAX_RESOURCE_LENGTH: usize = 32;

/// Above this many seconds the countdown is announced once per minute
pub const MINUTE_CADENCE_ABOVE_SECS: u64 = 60;

/// At or below this many seconds the countdown is announced every second
pub const FINAL_CADENCE_SECS: u64 = 10;

/// Between the minute and final cadence the countdown is announced on this step
pub const SECONDS_CADENCE_STEP: u64 = 10;
