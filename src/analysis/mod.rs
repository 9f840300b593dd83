pub mod client;
pub mod model;

pub use client::{create_analysis_service, AnalysisClient, AnalysisService};
pub use model::{
    AnalysisResult, BodyLeanRecord, FrameAnnotations, HipDropRecord, LandingRecord, LandingType,
    Landmark, LandmarkSet, LeanClass, POSE_LANDMARK_COUNT,
};
