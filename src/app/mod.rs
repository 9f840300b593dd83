pub mod controller;
pub mod overlay_app;
pub mod views;

pub use overlay_app::OverlayApp;
pub use views::overlay_view::OverlayView;
