use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Analysis Error: {0}")]
    Analysis(#[from] AnalyzeError),
    #[error("UI Error: {0}")]
    Ui(String),
}

// Errors raised while uploading a video to the pose service
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Failed to read video {path}: {source}")]
    ReadVideo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to build request: {0}")]
    Request(String),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Pose service answered with status {status}")]
    Status { status: u16 },
    #[error("Pose service did not answer within {0} ms")]
    Timeout(u64),
    #[error("Failed to decode analysis response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Analysis task stopped: {0}")]
    Interrupted(String),
}
