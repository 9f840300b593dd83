use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError as MpscTryRecvError;
use tracing::{debug, error, info};

use crate::analysis::{create_analysis_service, AnalysisResult, AnalysisService};
use crate::app::controller::{AnalysisController, RequestOutcome};
use crate::app::views::{OverlayView, View};
use crate::config::Settings;
use crate::error::AppError;
use crate::media::{DialogPicker, MediaPicker, MediaSlot, PickOptions, VideoAsset};
use crate::overlay::{AnalysisPanel, OverlayItem, OverlayRenderer, Viewport};
use crate::playback::{ClockedPlayer, FrameSync, PlaybackStatus};

const WINDOW_TITLE: &str = "StrideView - Pose Overlay";

/// Shapes for `frame_index`. Without an analysis the defaults of an empty
/// result are drawn.
pub fn overlay_items(
    renderer: &OverlayRenderer,
    result: Option<&AnalysisResult>,
    frame_index: usize,
) -> Vec<OverlayItem> {
    let empty = AnalysisResult::default();
    let result = result.unwrap_or(&empty);
    renderer.render(
        &result.frame(frame_index),
        result.most_frequent_landing_type.as_deref(),
    )
}

pub enum UiUpdate {
    VideoPicked(Option<VideoAsset>),
}

pub struct OverlayApp {
    settings: Settings,
    media: MediaSlot,
    picker: Arc<dyn MediaPicker>,
    pick_options: PickOptions,
    picking: bool,
    ui_update_tx: mpsc::Sender<UiUpdate>,
    ui_update_rx: mpsc::Receiver<UiUpdate>,
    player: Option<Arc<ClockedPlayer>>,
    frame_sync: FrameSync,
    analysis: AnalysisController,
    renderer: OverlayRenderer,
}

impl OverlayApp {
    pub fn new(settings: Settings, service: AnalysisService, picker: Arc<dyn MediaPicker>) -> Self {
        let (ui_update_tx, ui_update_rx) = mpsc::channel::<UiUpdate>(8);
        let frame_sync = FrameSync::new(
            settings.frame_rate(),
            Duration::from_millis(settings.playback.poll_interval_ms),
        );
        let renderer = OverlayRenderer::new(Viewport::widescreen(settings.overlay.canvas_width))
            .with_bounce_threshold(settings.overlay.bounce_threshold);

        Self {
            settings,
            media: MediaSlot::new(),
            picker,
            pick_options: PickOptions::default(),
            picking: false,
            ui_update_tx,
            ui_update_rx,
            player: None,
            frame_sync,
            analysis: AnalysisController::new(service),
            renderer,
        }
    }

    pub fn start_gui(settings: Settings) -> Result<(), AppError> {
        let service = create_analysis_service(&settings.service)?;
        let width = settings.overlay.canvas_width;
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(egui::vec2(width + 40.0, width * 9.0 / 16.0 + 260.0))
                .with_title(WINDOW_TITLE),
            ..Default::default()
        };

        info!("Analysis endpoint: {}", settings.service.endpoint);
        eframe::run_native(
            WINDOW_TITLE,
            options,
            Box::new(move |_cc| {
                Ok(Box::new(OverlayApp::new(
                    settings,
                    service,
                    Arc::new(DialogPicker),
                )))
            }),
        )
        .map_err(|e| AppError::Ui(e.to_string()))
    }

    fn pick_video(&mut self) {
        if self.picking {
            return;
        }
        self.picking = true;
        let picker = self.picker.clone();
        let options = self.pick_options.clone();
        let ui_update_tx = self.ui_update_tx.clone();
        tokio::spawn(async move {
            let picked = picker.pick_video(&options).await;
            if let Err(e) = ui_update_tx.send(UiUpdate::VideoPicked(picked)).await {
                error!("Error sending picker result: {}", e);
            }
        });
    }

    fn on_video_picked(&mut self, picked: Option<VideoAsset>) {
        self.picking = false;
        if !self.media.apply(picked) {
            return;
        }
        let player = Arc::new(ClockedPlayer::loaded(Some(
            self.settings.playback.assumed_duration_ms,
        )));
        self.frame_sync.bind(player.clone());
        self.player = Some(player);
    }

    fn detect_pose(&mut self) {
        match self.analysis.request(self.media.current()) {
            RequestOutcome::Started => debug!("Analysis started"),
            RequestOutcome::Busy | RequestOutcome::NoVideo => {}
        }
    }

    fn on_analysis_applied(&mut self) {
        let (Some(snapshot), Some(player), Some(current)) =
            (self.analysis.snapshot(), &self.player, self.media.current())
        else {
            return;
        };
        // Loop over the analysed span once we know it belongs to the clip on screen.
        let frames = snapshot.result.frame_count();
        if snapshot.asset == *current && frames > 0 {
            player.set_duration(Some(self.frame_sync.rate().frame_start_millis(frames)));
        }
    }

    fn drain_ui_updates(&mut self) {
        loop {
            match self.ui_update_rx.try_recv() {
                Ok(UiUpdate::VideoPicked(picked)) => self.on_video_picked(picked),
                Err(MpscTryRecvError::Empty) => break,
                Err(MpscTryRecvError::Disconnected) => {
                    error!("UI update receiver disconnected");
                    break;
                }
            }
        }
    }

    fn playback_line(&self, frame_index: usize) -> String {
        match self.player.as_ref().map(|player| player.snapshot()) {
            Some(PlaybackStatus::Loaded {
                position_millis, ..
            }) => format!(
                "Position: {:.2}s  Frame: {}",
                position_millis as f64 / 1000.0,
                frame_index
            ),
            _ => "Not loaded".to_string(),
        }
    }

    fn build_view(&mut self, available_width: f32) -> OverlayView {
        let width = self.settings.overlay.canvas_width.min(available_width.max(1.0));
        self.renderer.set_viewport(Viewport::widescreen(width));

        let frame_index = self.frame_sync.current_frame();
        let snapshot = self.analysis.snapshot();
        let result = snapshot.as_ref().map(|snapshot| &snapshot.result);
        let items = overlay_items(&self.renderer, result, frame_index);
        let panel = result.map(|result| AnalysisPanel::new(&result.frame(frame_index), result));

        OverlayView::new(
            self.renderer.viewport(),
            items,
            self.playback_line(frame_index),
            panel,
            self.analysis.is_loading(),
        )
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_ui_updates();
        if self.analysis.poll() {
            self.on_analysis_applied();
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.heading(WINDOW_TITLE);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!self.picking, egui::Button::new("Upload a Video"))
                    .clicked()
                {
                    self.pick_video();
                }
                if self.media.current().is_some() {
                    let idle = !self.analysis.is_loading();
                    if ui
                        .add_enabled(idle, egui::Button::new("Detect Pose"))
                        .clicked()
                    {
                        self.detect_pose();
                    }
                    if let Some(player) = &self.player {
                        let label = if player.is_playing() { "Pause" } else { "Play" };
                        if ui.button(label).clicked() {
                            if player.is_playing() {
                                player.pause();
                            } else {
                                player.resume();
                            }
                        }
                    }
                }
            });
            if let Some(asset) = self.media.current() {
                ui.label(format!("Video: {}", asset));
            }
            if let Some(snapshot) = self.analysis.snapshot() {
                ui.label(format!(
                    "Analysis received {}",
                    snapshot.received_at.format("%H:%M:%S")
                ));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.media.current().is_some() {
                let mut view = self.build_view(ui.available_width());
                view.draw(ui);
            } else {
                ui.heading("No video selected");
            }
        });

        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{OverlayColor, OverlayElement, Shape};

    fn labels(items: &[OverlayItem]) -> Vec<(String, OverlayColor)> {
        items
            .iter()
            .filter_map(|item| match &item.shape {
                Shape::Text { text, color, .. } => Some((text.clone(), *color)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn defaults_are_drawn_before_any_analysis() {
        let renderer = OverlayRenderer::new(Viewport::widescreen(640.0));
        for frame_index in [0, 42] {
            let items = overlay_items(&renderer, None, frame_index);
            let elements: Vec<OverlayElement> = items.iter().map(|item| item.element).collect();
            assert_eq!(
                elements,
                vec![OverlayElement::HipDrop, OverlayElement::VerticalBounce]
            );
            assert_eq!(
                labels(&items),
                vec![
                    ("No Hip Drop".to_string(), OverlayColor::Black),
                    ("Vertical Bounce: 0.00".to_string(), OverlayColor::Blue),
                ]
            );
        }
    }

    #[test]
    fn analysis_frame_is_drawn_when_present() {
        let renderer = OverlayRenderer::new(Viewport::widescreen(640.0));
        let result = AnalysisResult::from_slice(
            br#"{"hipdrop_analysis": [{"significant": false}, {"significant": true}],
                 "vertical_bounces": [0.01, 0.2],
                 "most_frequent_landing_type": "heelfoot"}"#,
        )
        .unwrap();
        let items = overlay_items(&renderer, Some(&result), 1);
        assert_eq!(
            labels(&items),
            vec![
                ("Hip Dropped".to_string(), OverlayColor::Black),
                ("heelfoot".to_string(), OverlayColor::Purple),
                ("Vertical Bounce: 0.20".to_string(), OverlayColor::Red),
            ]
        );
    }
}
