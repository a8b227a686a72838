mod constants;
mod notice;
mod odds;
mod phase;
mod pot;

pub use constants::*;
pub use notice::*;
pub use odds::*;
pub use phase::*;
pub use pot::*;
