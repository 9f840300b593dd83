pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod media;
pub mod overlay;
pub mod playback;

pub use crate::config::Settings;
pub use crate::error::{AnalyzeError, AppError};

pub use analysis::{AnalysisClient, AnalysisResult};
pub use app::OverlayApp;
