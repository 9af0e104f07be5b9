//! mcp-control-panel: egui desktop window for the MCP Control Panel.
//!
//! Single binary; the window talks to the panel worker via tokio mpsc (mcp_bridge).

pub mod mcp_control_panel;

pub use mcp_control_panel::{
    indicator_color, mcp_control_panel_channel, spawn_panel_worker, McpBridgeSender,
    McpControlPanel, PanelAction,
};
