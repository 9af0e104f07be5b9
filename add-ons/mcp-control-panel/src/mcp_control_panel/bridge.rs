//! mcp_bridge: async channel between the window and the panel worker.
//!
//! The UI thread uses `try_send` (non-blocking); the worker owns a tokio runtime, runs
//! `ControlPanel::initialize` and executes each action as its own task.

use mcp_panel_core::ControlPanel;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// User actions relayed from the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Start,
    Stop,
    /// Send whatever is in the model's command input.
    SendCommand,
}

pub type McpBridgeSender = mpsc::Sender<PanelAction>;

pub type McpBridgeReceiver = mpsc::Receiver<PanelAction>;

/// Creates a bounded channel for panel actions.
pub fn mcp_control_panel_channel(capacity: usize) -> (McpBridgeSender, McpBridgeReceiver) {
    mpsc::channel(capacity)
}

/// Starts the worker thread with its own current-thread runtime.
pub fn spawn_panel_worker(
    panel: Arc<ControlPanel>,
    rx: McpBridgeReceiver,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("mcp-panel-worker".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!(error = %e, "could not build panel runtime");
                    return;
                }
            };
            rt.block_on(run_worker(panel, rx));
        })
}

/// Initializes the panel and runs actions until every sender is dropped, then waits
/// for actions still in flight and stops the pollers.
pub async fn run_worker(panel: Arc<ControlPanel>, mut rx: McpBridgeReceiver) {
    let pollers = panel.initialize();
    let mut actions = JoinSet::new();

    while let Some(action) = rx.recv().await {
        tracing::debug!(?action, "bridge action");
        let panel = Arc::clone(&panel);
        actions.spawn(async move {
            match action {
                PanelAction::Start => panel.handle_start_server().await,
                PanelAction::Stop => panel.handle_stop_server().await,
                PanelAction::SendCommand => panel.handle_send_command().await,
            }
        });
        // reap finished actions so the set does not grow for the whole session
        while actions.try_join_next().is_some() {}
    }

    while actions.join_next().await.is_some() {}
    pollers.shutdown();
    tracing::info!("panel bridge closed; worker stopped");
}
