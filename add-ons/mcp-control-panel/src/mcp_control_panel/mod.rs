//! MCP Control Panel window.
//!
//! Renders a [`PanelModel`] snapshot each frame: status dot and text, Start/Stop,
//! live console, command input and toasts. Clicks and Enter are relayed to the worker
//! over `mcp_bridge` (tokio mpsc).

mod bridge;

pub use bridge::{
    mcp_control_panel_channel, run_worker, spawn_panel_worker, McpBridgeReceiver,
    McpBridgeSender, PanelAction,
};

use egui::{Color32, RichText};
use mcp_panel_core::{Indicator, PanelModel, PanelSnapshot, Toast};
use std::sync::Arc;
use std::time::Duration;

const PULSE_PERIOD_SECS: f64 = 2.0;

pub struct McpControlPanel {
    model: Arc<PanelModel>,
    /// Optional sender to the panel worker (mcp_bridge).
    sender: Option<McpBridgeSender>,
}

impl McpControlPanel {
    /// Creates a panel with no bridge (renders only; buttons do nothing).
    pub fn new(model: Arc<PanelModel>) -> Self {
        Self {
            model,
            sender: None,
        }
    }

    pub fn with_bridge(mut self, sender: McpBridgeSender) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Renders the whole window. Call each frame from the eframe app.
    pub fn mcp_ui(&mut self, ctx: &egui::Context) {
        let snapshot = self.model.snapshot();
        let now = ctx.input(|i| i.time);

        egui::TopBottomPanel::top("mcp_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("MCP Control Panel");
                ui.separator();
                let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                ui.painter()
                    .circle_filled(rect.center(), 6.0, indicator_color(snapshot.indicator, now));
                ui.label(RichText::new(snapshot.status_text).strong());
            });
        });

        egui::TopBottomPanel::bottom("mcp_command_bar").show(ctx, |ui| {
            self.command_bar(ui, &snapshot);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(snapshot.controls.start_enabled, egui::Button::new("Start Server"))
                    .clicked()
                {
                    self.mcp_try_send(PanelAction::Start);
                }
                if ui
                    .add_enabled(snapshot.controls.stop_enabled, egui::Button::new("Stop Server"))
                    .clicked()
                {
                    self.mcp_try_send(PanelAction::Stop);
                }
            });
            ui.separator();

            // only the visible rows are copied out of the model
            let row_height = ui.text_style_height(&egui::TextStyle::Monospace);
            let mut console = egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .stick_to_bottom(true);
            if self.model.take_scroll_request() {
                let spacing = ui.spacing().item_spacing.y;
                console = console
                    .vertical_scroll_offset((row_height + spacing) * snapshot.console_len as f32);
            }
            console.show_rows(ui, row_height, snapshot.console_len, |ui, rows| {
                for line in self.model.console_rows(rows) {
                    ui.label(RichText::new(line).monospace());
                }
            });
        });

        toast_stack(ctx, &snapshot.toasts);

        if snapshot.indicator.pulsing {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }

    fn command_bar(&mut self, ui: &mut egui::Ui, snapshot: &PanelSnapshot) {
        let enabled = snapshot.controls.command_enabled;
        ui.horizontal(|ui| {
            let mut input = snapshot.command_input.clone();
            let width = (ui.available_width() - 80.0).max(120.0);
            let response = ui.add_enabled(
                enabled,
                egui::TextEdit::singleline(&mut input)
                    .desired_width(width)
                    .font(egui::TextStyle::Monospace)
                    .hint_text("Enter a server command..."),
            );
            if response.changed() {
                self.model.set_command_input(input);
            }
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui.add_enabled(enabled, egui::Button::new("Send")).clicked();
            if enabled && (enter || clicked) {
                self.mcp_try_send(PanelAction::SendCommand);
                response.request_focus();
            }
        });
    }

    fn mcp_try_send(&self, action: PanelAction) {
        if let Some(ref tx) = self.sender {
            if let Err(e) = tx.try_send(action) {
                tracing::warn!(?action, error = %e, "panel action dropped");
            }
        }
    }
}

/// Indicator colour at time `now` (seconds). Pulsing fades alpha between 40% and 100%.
pub fn indicator_color(indicator: Indicator, now: f64) -> Color32 {
    let [r, g, b] = indicator.color.rgb();
    if !indicator.pulsing {
        return Color32::from_rgb(r, g, b);
    }
    let phase = (now % PULSE_PERIOD_SECS) / PULSE_PERIOD_SECS;
    let wave = 0.5 + 0.5 * (phase * std::f64::consts::TAU).cos();
    let alpha = (0.4 + 0.6 * wave).clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(r, g, b, (alpha * 255.0) as u8)
}

fn toast_stack(ctx: &egui::Context, toasts: &[Toast]) {
    if toasts.is_empty() {
        return;
    }
    egui::Area::new(egui::Id::new("mcp_toasts"))
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 48.0])
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            for toast in toasts {
                let [r, g, b] = toast.severity.rgb();
                egui::Frame::none()
                    .fill(Color32::from_rgb(r, g, b))
                    .rounding(8.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(toast.message.as_str()).color(Color32::WHITE));
                    });
                ui.add_space(6.0);
            }
        });
}
