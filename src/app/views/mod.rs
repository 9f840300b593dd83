pub mod overlay_view;

pub use overlay_view::OverlayView;

pub trait View {
    fn draw(&mut self, ui: &mut egui::Ui);
}
