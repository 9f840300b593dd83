use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};

use crate::app::views::View;
use crate::overlay::{AnalysisPanel, OverlayColor, OverlayItem, Point, Shape, Viewport};

const SURFACE_COLOR: Color32 = Color32::from_gray(225);

fn to_color(color: OverlayColor) -> Color32 {
    match color {
        OverlayColor::Red => Color32::RED,
        OverlayColor::Green => Color32::GREEN,
        OverlayColor::Blue => Color32::BLUE,
        OverlayColor::Black => Color32::BLACK,
        OverlayColor::Purple => Color32::from_rgb(128, 0, 128),
    }
}

fn to_pos(origin: Pos2, point: Point) -> Pos2 {
    origin + Vec2::new(point.x, point.y)
}

/// The video surface with the overlay for one frame painted on top.
pub struct OverlayView {
    viewport: Viewport,
    items: Vec<OverlayItem>,
    playback_line: String,
    panel: Option<AnalysisPanel>,
    loading: bool,
}

impl OverlayView {
    pub fn new(
        viewport: Viewport,
        items: Vec<OverlayItem>,
        playback_line: String,
        panel: Option<AnalysisPanel>,
        loading: bool,
    ) -> Self {
        Self {
            viewport,
            items,
            playback_line,
            panel,
            loading,
        }
    }

    fn draw_surface(&self, ui: &mut egui::Ui) {
        let size = Vec2::new(self.viewport.width, self.viewport.height);
        let (response, painter) = ui.allocate_painter(size, Sense::hover());
        let rect: Rect = response.rect;
        painter.rect_filled(rect, 0.0, SURFACE_COLOR);
        let painter = painter.with_clip_rect(rect);
        let origin = rect.min;

        for item in &self.items {
            match &item.shape {
                Shape::Circle {
                    center,
                    radius,
                    color,
                } => {
                    painter.circle_filled(to_pos(origin, *center), *radius, to_color(*color));
                }
                Shape::Line {
                    from,
                    to,
                    width,
                    color,
                } => {
                    painter.line_segment(
                        [to_pos(origin, *from), to_pos(origin, *to)],
                        Stroke::new(*width, to_color(*color)),
                    );
                }
                Shape::Text {
                    anchor,
                    text,
                    size,
                    color,
                    ..
                } => {
                    // Anchors are text baselines.
                    painter.text(
                        to_pos(origin, *anchor),
                        Align2::LEFT_BOTTOM,
                        text,
                        FontId::proportional(*size),
                        to_color(*color),
                    );
                }
            }
        }
    }

    fn draw_panel(&self, ui: &mut egui::Ui, panel: &AnalysisPanel) {
        ui.group(|ui| {
            for line in panel.lines() {
                ui.label(line);
            }
        });
    }
}

impl View for OverlayView {
    fn draw(&mut self, ui: &mut egui::Ui) {
        self.draw_surface(ui);
        ui.label(&self.playback_line);

        if self.loading {
            ui.label("Loading...");
        }

        if let Some(panel) = &self.panel {
            self.draw_panel(ui, panel);
        }
    }
}
