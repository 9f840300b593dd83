use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::clock::FrameRate;
use super::source::{PlaybackSource, PlaybackStatus};

/// Periodic task that turns the playback position into the active frame index.
pub struct FrameTicker {
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FrameTicker {
    pub fn start(
        source: Arc<dyn PlaybackSource>,
        rate: FrameRate,
        period: Duration,
        frame_tx: Arc<watch::Sender<usize>>,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let task = Self::start_task(source, rate, period, frame_tx, cancel_token.clone());
        Self {
            cancel_token,
            task: Some(task),
        }
    }

    fn start_task(
        source: Arc<dyn PlaybackSource>,
        rate: FrameRate,
        period: Duration,
        frame_tx: Arc<watch::Sender<usize>>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = interval.tick() => {
                        // Unloaded ticks leave the index where it was.
                        if let PlaybackStatus::Loaded { position_millis, .. } = source.status().await {
                            let index = rate.frame_index(position_millis);
                            frame_tx.send_if_modified(|current| {
                                if *current == index {
                                    false
                                } else {
                                    *current = index;
                                    true
                                }
                            });
                        }
                    }
                }
            }
            debug!("Frame ticker stopped");
        })
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| !task.is_finished() && !self.cancel_token.is_cancelled())
    }

    pub fn stop(&mut self) {
        self.cancel_token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loaded,
}

/// Owns at most one [`FrameTicker`], bound to the currently loaded video.
pub struct FrameSync {
    rate: FrameRate,
    period: Duration,
    frame_tx: Arc<watch::Sender<usize>>,
    frame_rx: watch::Receiver<usize>,
    ticker: Option<FrameTicker>,
}

impl FrameSync {
    pub fn new(rate: FrameRate, period: Duration) -> Self {
        let (frame_tx, frame_rx) = watch::channel(0);
        Self {
            rate,
            period,
            frame_tx: Arc::new(frame_tx),
            frame_rx,
            ticker: None,
        }
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    pub fn state(&self) -> SyncState {
        match &self.ticker {
            Some(_) => SyncState::Loaded,
            None => SyncState::Idle,
        }
    }

    /// Stops the current ticker, then starts a new one polling `source`.
    pub fn bind(&mut self, source: Arc<dyn PlaybackSource>) {
        self.unbind();
        self.frame_tx.send_replace(0);
        self.ticker = Some(FrameTicker::start(
            source,
            self.rate,
            self.period,
            self.frame_tx.clone(),
        ));
        info!(
            "Frame sync started at {:.3} fps, polling every {:?}",
            self.rate.as_f64(),
            self.period
        );
    }

    pub fn unbind(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
            debug!("Frame sync stopped");
        }
    }

    pub fn current_frame(&self) -> usize {
        *self.frame_rx.borrow()
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        self.unbind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    struct CountingSource {
        polls: AtomicUsize,
        position_millis: AtomicU64,
        loaded: AtomicBool,
    }

    impl CountingSource {
        fn at(position_millis: u64) -> Arc<Self> {
            Arc::new(Self {
                polls: AtomicUsize::new(0),
                position_millis: AtomicU64::new(position_millis),
                loaded: AtomicBool::new(true),
            })
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlaybackSource for CountingSource {
        async fn status(&self) -> PlaybackStatus {
            self.polls.fetch_add(1, Ordering::SeqCst);
            if !self.loaded.load(Ordering::SeqCst) {
                return PlaybackStatus::Unloaded;
            }
            PlaybackStatus::Loaded {
                position_millis: self.position_millis.load(Ordering::SeqCst),
                duration_millis: None,
                is_playing: true,
            }
        }
    }

    fn sync() -> FrameSync {
        FrameSync::new(FrameRate::default(), Duration::from_millis(1000 / 30))
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_index_of_playback_position() {
        let mut sync = sync();
        assert_eq!(sync.state(), SyncState::Idle);
        let source = CountingSource::at(999);
        sync.bind(source.clone());
        assert_eq!(sync.state(), SyncState::Loaded);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sync.current_frame(), 29);

        source.position_millis.store(1_000, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sync.current_frame(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_thirty_hertz() {
        let mut sync = sync();
        let source = CountingSource::at(0);
        sync.bind(source.clone());
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!((29..=32).contains(&source.polls()), "{} polls", source.polls());
    }

    #[tokio::test(start_paused = true)]
    async fn unloaded_ticks_keep_the_last_index() {
        let mut sync = sync();
        let source = CountingSource::at(2_000);
        sync.bind(source.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sync.current_frame(), 60);

        source.loaded.store(false, Ordering::SeqCst);
        source.position_millis.store(5_000, Ordering::SeqCst);
        let polls = source.polls();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(source.polls() > polls);
        assert_eq!(sync.current_frame(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn rebinding_leaves_exactly_one_ticker() {
        let mut sync = sync();
        let first = CountingSource::at(0);
        sync.bind(first.clone());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(first.polls() > 0);

        let second = CountingSource::at(1_000);
        sync.bind(second.clone());
        let first_polls = first.polls();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(first.polls(), first_polls);
        assert!((14..=17).contains(&second.polls()), "{} polls", second.polls());
        assert_eq!(sync.current_frame(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn unbind_stops_polling() {
        let mut sync = sync();
        let source = CountingSource::at(0);
        sync.bind(source.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;
        sync.unbind();
        assert_eq!(sync.state(), SyncState::Idle);

        let polls = source.polls();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(source.polls(), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_ticker_cancels_it() {
        let (frame_tx, _frame_rx) = watch::channel(0);
        let source = CountingSource::at(0);
        let ticker = FrameTicker::start(
            source.clone(),
            FrameRate::default(),
            Duration::from_millis(33),
            Arc::new(frame_tx),
        );
        assert!(ticker.is_running());
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(ticker);

        let polls = source.polls();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(source.polls(), polls);
    }
}
