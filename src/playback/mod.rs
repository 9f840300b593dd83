pub mod clock;
pub mod source;
pub mod ticker;

pub use clock::FrameRate;
pub use source::{ClockedPlayer, PlaybackSource, PlaybackStatus};
pub use ticker::{FrameSync, FrameTicker, SyncState};
