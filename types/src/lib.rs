//! Common types used throughout stakepot.

pub mod lottery;

use commonware_codec::DecodeExt;
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::from_hex_formatted;

/// Identity of a participant in a round.
pub type Participant = PublicKey;

/// Parse a hex-encoded participant identity.
pub fn parse_participant(value: &str) -> Option<Participant> {
    from_hex_formatted(value).and_then(|key| Participant::decode(key.as_ref()).ok())
}
