//! mcp-panel-core: client side of the MCP Control Panel.
//!
//! Starts and stops a backend-managed server process, polls its status and console
//! output, and forwards typed commands over the backend's `/api/*` REST endpoints.
//! UI-independent; the desktop add-on renders [`PanelModel`] snapshots.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use api::{
    ActionResponse, ApiClient, ApiRequest, ConsoleResponse, FailureNotice, HttpTransport,
    RawResponse, StatusResponse, Transport,
};
pub use client::{ControlPanel, Pollers};
pub use config::PanelConfig;
pub use error::PanelError;
pub use logging::init_tracing;
pub use model::{
    Controls, Indicator, IndicatorColor, PanelModel, PanelSnapshot, ServerStatus, Toast,
    ToastSeverity,
};
