use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Unloaded,
    Loaded {
        position_millis: u64,
        duration_millis: Option<u64>,
        is_playing: bool,
    },
}

/// A playback surface that can report where it currently is.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    async fn status(&self) -> PlaybackStatus;
}

#[derive(Debug)]
struct PlayerState {
    loaded: bool,
    playing: bool,
    looping: bool,
    duration_millis: Option<u64>,
    // Position at `anchor`; playback advances from there while playing.
    base_millis: u64,
    anchor: Instant,
}

impl PlayerState {
    fn position(&self, now: Instant) -> u64 {
        let elapsed = if self.playing {
            now.saturating_duration_since(self.anchor).as_millis() as u64
        } else {
            0
        };
        let raw = self.base_millis.saturating_add(elapsed);
        match self.duration_millis {
            Some(0) => 0,
            Some(duration) if self.looping => raw % duration,
            Some(duration) => raw.min(duration),
            None => raw,
        }
    }
}

/// Wall-clock driven player at rate 1.0. Starts playing and looping as soon
/// as it is loaded, like the preview surface it stands in for.
#[derive(Debug)]
pub struct ClockedPlayer {
    state: Mutex<PlayerState>,
}

impl ClockedPlayer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlayerState {
                loaded: false,
                playing: false,
                looping: true,
                duration_millis: None,
                base_millis: 0,
                anchor: Instant::now(),
            }),
        }
    }

    pub fn loaded(duration_millis: Option<u64>) -> Self {
        let player = Self::new();
        player.load(duration_millis);
        player
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PlayerState) -> R) -> R {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }

    pub fn load(&self, duration_millis: Option<u64>) {
        self.with_state(|state| {
            state.loaded = true;
            state.playing = true;
            state.duration_millis = duration_millis;
            state.base_millis = 0;
            state.anchor = Instant::now();
        });
        debug!("Player loaded, duration {:?} ms", duration_millis);
    }

    pub fn set_looping(&self, looping: bool) {
        self.with_state(|state| {
            let now = Instant::now();
            state.base_millis = state.position(now);
            state.anchor = now;
            state.looping = looping;
        });
    }

    pub fn set_duration(&self, duration_millis: Option<u64>) {
        self.with_state(|state| {
            let now = Instant::now();
            state.base_millis = state.position(now);
            state.anchor = now;
            state.duration_millis = duration_millis;
        });
    }

    pub fn pause(&self) {
        self.with_state(|state| {
            let now = Instant::now();
            state.base_millis = state.position(now);
            state.anchor = now;
            state.playing = false;
        });
    }

    pub fn resume(&self) {
        self.with_state(|state| {
            if state.loaded {
                state.anchor = Instant::now();
                state.playing = true;
            }
        });
    }

    pub fn seek(&self, position_millis: u64) {
        self.with_state(|state| {
            state.base_millis = match state.duration_millis {
                Some(duration) => position_millis.min(duration),
                None => position_millis,
            };
            state.anchor = Instant::now();
        });
    }

    pub fn is_playing(&self) -> bool {
        self.with_state(|state| state.playing)
    }

    pub fn snapshot(&self) -> PlaybackStatus {
        self.with_state(|state| {
            if !state.loaded {
                return PlaybackStatus::Unloaded;
            }
            PlaybackStatus::Loaded {
                position_millis: state.position(Instant::now()),
                duration_millis: state.duration_millis,
                is_playing: state.playing,
            }
        })
    }
}

impl Default for ClockedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackSource for ClockedPlayer {
    async fn status(&self) -> PlaybackStatus {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn position(player: &ClockedPlayer) -> u64 {
        match player.snapshot() {
            PlaybackStatus::Loaded {
                position_millis, ..
            } => position_millis,
            PlaybackStatus::Unloaded => panic!("player not loaded"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unloaded_player_reports_unloaded() {
        let player = ClockedPlayer::new();
        assert_eq!(player.status().await, PlaybackStatus::Unloaded);
    }

    #[tokio::test(start_paused = true)]
    async fn position_follows_the_clock_and_loops() {
        let player = ClockedPlayer::loaded(Some(2_000));
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(position(&player), 1_500);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(position(&player), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_position_until_resumed() {
        let player = ClockedPlayer::loaded(None);
        tokio::time::sleep(Duration::from_millis(400)).await;
        player.pause();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(position(&player), 400);
        assert!(!player.is_playing());

        player.resume();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(position(&player), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_moves_position_within_duration() {
        let player = ClockedPlayer::loaded(Some(3_000));
        player.seek(10_000);
        player.pause();
        assert_eq!(position(&player), 0);

        player.seek(2_500);
        assert_eq!(position(&player), 2_500);
    }

    #[tokio::test(start_paused = true)]
    async fn non_looping_player_stops_at_the_end() {
        let player = ClockedPlayer::loaded(Some(1_000));
        player.set_looping(false);
        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(position(&player), 1_000);
    }
}
