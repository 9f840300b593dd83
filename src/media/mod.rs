pub mod asset;
pub mod picker;

pub use asset::VideoAsset;
pub use picker::{DialogPicker, MediaPicker, MediaSlot, PickOptions};
