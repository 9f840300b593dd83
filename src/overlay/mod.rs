pub mod panel;
pub mod scene;
pub mod skeleton;

pub use panel::AnalysisPanel;
pub use scene::{
    bounce_color, OverlayColor, OverlayElement, OverlayItem, OverlayRenderer, Point, Shape,
    Viewport,
};
pub use skeleton::SKELETON_CONNECTIONS;
