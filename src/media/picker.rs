use async_trait::async_trait;
use tracing::{debug, info};

use super::asset::VideoAsset;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv", "webm", "3gp"];

/// What the platform picker is asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct PickOptions {
    pub title: String,
    pub allows_editing: bool,
    /// Crop aspect ratio as (width, height).
    pub aspect: (u32, u32),
    /// 1.0 keeps the original quality.
    pub quality: f32,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            title: "Select a video".to_string(),
            allows_editing: true,
            aspect: (4, 3),
            quality: 1.0,
        }
    }
}

/// Source of a single user-selected video. `None` covers both cancellation and
/// picker failure; neither is reported as an error.
#[async_trait]
pub trait MediaPicker: Send + Sync {
    async fn pick_video(&self, options: &PickOptions) -> Option<VideoAsset>;
}

/// Native file dialog. Editing, aspect and quality have no desktop equivalent
/// and are only logged.
#[derive(Debug, Clone, Default)]
pub struct DialogPicker;

#[async_trait]
impl MediaPicker for DialogPicker {
    async fn pick_video(&self, options: &PickOptions) -> Option<VideoAsset> {
        debug!(
            "Opening video picker (aspect {}:{}, quality {})",
            options.aspect.0, options.aspect.1, options.quality
        );
        let picked = rfd::AsyncFileDialog::new()
            .set_title(options.title.as_str())
            .add_filter("Video Files", VIDEO_EXTENSIONS)
            .pick_file()
            .await
            .map(|file| VideoAsset::new(file.path().to_path_buf()));
        match &picked {
            Some(asset) => info!("Picked video {}", asset),
            None => debug!("Video picker cancelled"),
        }
        picked
    }
}

/// Holds the video of the current session.
#[derive(Debug, Default)]
pub struct MediaSlot {
    current: Option<VideoAsset>,
}

impl MediaSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&VideoAsset> {
        self.current.as_ref()
    }

    /// Applies a picker outcome. Returns true when the held asset was replaced.
    pub fn apply(&mut self, picked: Option<VideoAsset>) -> bool {
        match picked {
            Some(asset) => {
                self.current = Some(asset);
                true
            }
            None => false,
        }
    }
}
