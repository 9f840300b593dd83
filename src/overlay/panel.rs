use crate::analysis::{AnalysisResult, FrameAnnotations, LandingType};

/// Text rows of the analysis side panel for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPanel {
    pub left_landing: String,
    pub right_landing: String,
    pub landing_type: String,
    pub hip_drop: &'static str,
    pub body_lean: String,
    pub vertical_bounce: String,
}

fn landing_text(landing: Option<&LandingType>) -> String {
    landing.map_or_else(|| "-".to_string(), ToString::to_string)
}

impl AnalysisPanel {
    pub fn new(frame: &FrameAnnotations<'_>, result: &AnalysisResult) -> Self {
        Self {
            left_landing: landing_text(frame.landing.left_landing_type.as_ref()),
            right_landing: landing_text(frame.landing.right_landing_type.as_ref()),
            landing_type: result
                .most_frequent_landing_type
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            hip_drop: if frame.hip_drop.significant {
                "Detected"
            } else {
                "None"
            },
            body_lean: frame.body_lean.text.clone().unwrap_or_default(),
            vertical_bounce: format!("{:.2}", frame.vertical_bounce),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Left Landing Type: {}", self.left_landing),
            format!("Right Landing Type: {}", self.right_landing),
            format!("Landing Type: {}", self.landing_type),
            format!("Hip Drop: {}", self.hip_drop),
            format!("Body Lean: {}", self.body_lean),
            format!("Vertical Bounce: {}", self.vertical_bounce),
        ]
    }
}
