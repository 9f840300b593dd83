use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

use crate::analysis::{AnalysisResult, AnalysisService};
use crate::error::AnalyzeError;
use crate::media::VideoAsset;

/// One complete analysis as shown on screen. Replaced as a whole, never patched.
#[derive(Debug)]
pub struct AnalysisSnapshot {
    pub asset: VideoAsset,
    pub result: AnalysisResult,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    NoVideo,
    Busy,
    Started,
}

struct AnalysisUpdate {
    asset: VideoAsset,
    outcome: Result<AnalysisResult, AnalyzeError>,
}

/// Drives uploads and owns the displayed analysis.
pub struct AnalysisController {
    service: AnalysisService,
    snapshot: Option<Arc<AnalysisSnapshot>>,
    loading: bool,
    update_tx: mpsc::Sender<AnalysisUpdate>,
    update_rx: mpsc::Receiver<AnalysisUpdate>,
}

impl AnalysisController {
    pub fn new(service: AnalysisService) -> Self {
        let (update_tx, update_rx) = mpsc::channel(4);
        Self {
            service,
            snapshot: None,
            loading: false,
            update_tx,
            update_rx,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn snapshot(&self) -> Option<Arc<AnalysisSnapshot>> {
        self.snapshot.clone()
    }

    /// Starts an upload of `asset`. At most one upload runs at a time.
    pub fn request(&mut self, asset: Option<&VideoAsset>) -> RequestOutcome {
        let Some(asset) = asset else {
            info!("No video selected");
            return RequestOutcome::NoVideo;
        };
        if self.loading {
            warn!("Analysis already in progress, ignoring request for {}", asset);
            return RequestOutcome::Busy;
        }

        self.loading = true;
        let service = self.service.clone();
        let update_tx = self.update_tx.clone();
        let asset = asset.clone();
        tokio::spawn(async move {
            let outcome = service.oneshot(asset.clone()).await;
            if update_tx
                .send(AnalysisUpdate { asset, outcome })
                .await
                .is_err()
            {
                debug!("Analysis finished after the controller was dropped");
            }
        });
        RequestOutcome::Started
    }

    /// Applies a finished upload if there is one. Never blocks.
    pub fn poll(&mut self) -> bool {
        match self.update_rx.try_recv() {
            Ok(update) => {
                self.apply(update);
                true
            }
            Err(_) => false,
        }
    }

    /// Waits for the upload in flight, if any, and applies its outcome.
    pub async fn settle(&mut self) -> bool {
        if !self.loading {
            return false;
        }
        match self.update_rx.recv().await {
            Some(update) => {
                self.apply(update);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, update: AnalysisUpdate) {
        self.loading = false;
        match update.outcome {
            Ok(result) => {
                info!(
                    "Analysis of {} ready: {} frames",
                    update.asset,
                    result.frame_count()
                );
                self.snapshot = Some(Arc::new(AnalysisSnapshot {
                    asset: update.asset,
                    result,
                    received_at: Utc::now(),
                }));
            }
            Err(e) => {
                error!("Error: {}", e);
            }
        }
    }
}
