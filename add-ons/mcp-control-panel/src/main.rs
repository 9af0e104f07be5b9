//! MCP Control Panel — start/stop the managed server, watch its console, send commands.
//!
//! Run with: cargo run -p mcp-control-panel
//! Backend URL and timings come from `config/control-panel.toml` or `MCP_PANEL__*`.

use eframe::egui;
use mcp_control_panel::{mcp_control_panel_channel, spawn_panel_worker, McpControlPanel};
use mcp_panel_core::{init_tracing, ControlPanel, PanelConfig};
use std::sync::Arc;

fn main() -> eframe::Result<()> {
    init_tracing();

    let config = PanelConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "control panel config not loaded; using defaults");
        PanelConfig::default()
    });
    tracing::info!(base_url = %config.base_url, "MCP Control Panel starting");

    let panel = match ControlPanel::from_config(&config) {
        Ok(panel) => panel,
        Err(e) => {
            tracing::error!(error = %e, "cannot create control panel client");
            std::process::exit(2);
        }
    };
    let model = Arc::clone(panel.model());

    let (tx, rx) = mcp_control_panel_channel(64);
    if let Err(e) = spawn_panel_worker(panel, rx) {
        tracing::error!(error = %e, "cannot start panel worker");
        std::process::exit(2);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_title("MCP Control Panel"),
        ..Default::default()
    };

    eframe::run_native(
        "MCP Control Panel",
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            model.set_repaint_hook(move || ctx.request_repaint());
            let panel = McpControlPanel::new(model).with_bridge(tx);
            Ok(Box::new(McpControlPanelApp::new(panel)))
        }),
    )
}

struct McpControlPanelApp {
    panel: McpControlPanel,
}

impl McpControlPanelApp {
    fn new(panel: McpControlPanel) -> Self {
        Self { panel }
    }
}

impl eframe::App for McpControlPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.panel.mcp_ui(ctx);
    }
}
