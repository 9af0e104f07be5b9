//! Panel model: everything the window shows, behind one lock.
//!
//! The model is the Rust counterpart of the page's DOM. Handlers and pollers mutate it,
//! the desktop add-on renders [`PanelSnapshot`]s of it. Console lines are plain text.

use parking_lot::Mutex;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const WELCOME_LINE: &str = "Welcome to the MCP Control Panel.";
pub const CHECKING_STATUS_LINE: &str = "Checking server status...";

/// Managed server state as reported by `/api/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerStatus {
    Online,
    #[default]
    Offline,
}

impl ServerStatus {
    /// Only the exact string `"Online"` counts as online.
    pub fn from_status_str(status: &str) -> Self {
        if status == "Online" {
            ServerStatus::Online
        } else {
            ServerStatus::Offline
        }
    }

    pub fn is_online(self) -> bool {
        self == ServerStatus::Online
    }

    pub fn label(self) -> &'static str {
        match self {
            ServerStatus::Online => "Online",
            ServerStatus::Offline => "Offline",
        }
    }
}

impl From<bool> for ServerStatus {
    fn from(online: bool) -> Self {
        if online {
            ServerStatus::Online
        } else {
            ServerStatus::Offline
        }
    }
}

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastSeverity {
    Success,
    Error,
    #[default]
    Info,
}

impl ToastSeverity {
    /// Maps the backend's `status` field; anything other than `success` or `error` is
    /// `Info`.
    pub fn from_status_str(status: &str) -> Self {
        match status {
            "success" => ToastSeverity::Success,
            "error" => ToastSeverity::Error,
            _ => ToastSeverity::Info,
        }
    }

    /// Background colour as RGB.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            ToastSeverity::Success => IndicatorColor::Green.rgb(),
            ToastSeverity::Error => IndicatorColor::Red.rgb(),
            ToastSeverity::Info => [59, 130, 246],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColor {
    Green,
    Red,
}

impl IndicatorColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            IndicatorColor::Green => [34, 197, 94],
            IndicatorColor::Red => [239, 68, 68],
        }
    }
}

/// Status dot next to the status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub color: IndicatorColor,
    pub pulsing: bool,
}

/// Enabled flags of the three server-state-dependent controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub command_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: ToastSeverity,
}

/// One frame's worth of panel state. The console is not copied; views read the rows
/// they show through [`PanelModel::console_rows`].
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSnapshot {
    pub status: ServerStatus,
    pub status_text: &'static str,
    pub indicator: Indicator,
    pub controls: Controls,
    pub console_len: usize,
    pub toasts: Vec<Toast>,
    pub command_input: String,
}

struct PanelState {
    status: ServerStatus,
    status_text: &'static str,
    indicator: Indicator,
    controls: Controls,
    console: Vec<String>,
    scroll_to_bottom: bool,
    toasts: Vec<Toast>,
    command_input: String,
}

impl Default for PanelState {
    /// Matches the static markup before the first poll resolves: offline, start enabled,
    /// stop and command input disabled.
    fn default() -> Self {
        Self {
            status: ServerStatus::Offline,
            status_text: ServerStatus::Offline.label(),
            indicator: Indicator {
                color: IndicatorColor::Red,
                pulsing: true,
            },
            controls: Controls {
                start_enabled: true,
                stop_enabled: false,
                command_enabled: false,
            },
            console: Vec::new(),
            scroll_to_bottom: false,
            toasts: Vec::new(),
            command_input: String::new(),
        }
    }
}

type RepaintHook = Box<dyn Fn() + Send + Sync>;

/// Shared, lock-protected panel state. Cheap to clone via `Arc`.
pub struct PanelModel {
    state: Mutex<PanelState>,
    next_toast_id: AtomicU64,
    toast_ttl: Duration,
    repaint: Mutex<Option<RepaintHook>>,
}

impl PanelModel {
    pub fn new(toast_ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PanelState::default()),
            next_toast_id: AtomicU64::new(1),
            toast_ttl,
            repaint: Mutex::new(None),
        })
    }

    /// Registers a callback invoked after every mutation (the window's repaint request).
    pub fn set_repaint_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.repaint.lock() = Some(Box::new(hook));
    }

    fn changed(&self) {
        if let Some(hook) = self.repaint.lock().as_ref() {
            hook();
        }
    }

    /// Projects the server state onto status text, indicator and control flags.
    /// Setting the same state twice yields the same projection.
    pub fn update_ui(&self, is_online: bool) {
        let status = ServerStatus::from(is_online);
        {
            let mut s = self.state.lock();
            s.status = status;
            s.status_text = status.label();
            s.indicator = Indicator {
                color: if is_online {
                    IndicatorColor::Green
                } else {
                    IndicatorColor::Red
                },
                pulsing: !is_online,
            };
            s.controls = Controls {
                start_enabled: !is_online,
                stop_enabled: is_online,
                command_enabled: is_online,
            };
        }
        self.changed();
    }

    pub fn status(&self) -> ServerStatus {
        self.state.lock().status
    }

    pub fn is_server_online(&self) -> bool {
        self.status().is_online()
    }

    /// Appends one line and asks the view to scroll to the bottom.
    pub fn append_to_console(&self, text: impl Into<String>) {
        {
            let mut s = self.state.lock();
            s.console.push(text.into());
            s.scroll_to_bottom = true;
        }
        self.changed();
    }

    pub fn console_lines(&self) -> Vec<String> {
        self.state.lock().console.clone()
    }

    pub fn console_len(&self) -> usize {
        self.state.lock().console.len()
    }

    /// Copies the lines in `rows`, clamped to the current console length.
    pub fn console_rows(&self, rows: Range<usize>) -> Vec<String> {
        let s = self.state.lock();
        let end = rows.end.min(s.console.len());
        let start = rows.start.min(end);
        s.console[start..end].to_vec()
    }

    /// Returns true once after any append; the view scrolls to the bottom when it does.
    pub fn take_scroll_request(&self) -> bool {
        std::mem::take(&mut self.state.lock().scroll_to_bottom)
    }

    /// Shows a toast that removes itself after the configured lifetime.
    ///
    /// Must be called from within a tokio runtime; the removal is a spawned timer task.
    pub fn show_toast(self: &Arc<Self>, message: impl Into<String>, severity: ToastSeverity) -> u64 {
        let id = self.next_toast_id.fetch_add(1, Ordering::Relaxed);
        self.state.lock().toasts.push(Toast {
            id,
            message: message.into(),
            severity,
        });
        self.changed();

        let model = Arc::clone(self);
        let ttl = self.toast_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            model.dismiss_toast(id);
        });
        id
    }

    pub fn dismiss_toast(&self, id: u64) {
        let removed = {
            let mut s = self.state.lock();
            let before = s.toasts.len();
            s.toasts.retain(|t| t.id != id);
            s.toasts.len() != before
        };
        if removed {
            self.changed();
        }
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.state.lock().toasts.clone()
    }

    pub fn command_input(&self) -> String {
        self.state.lock().command_input.clone()
    }

    pub fn set_command_input(&self, text: impl Into<String>) {
        self.state.lock().command_input = text.into();
    }

    /// Trims and clears the command input in one step. `None` when there is nothing to
    /// send; whitespace-only input is left in place, as the original does.
    pub fn take_command(&self) -> Option<String> {
        let mut s = self.state.lock();
        let command = s.command_input.trim().to_string();
        if command.is_empty() {
            return None;
        }
        s.command_input.clear();
        Some(command)
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let s = self.state.lock();
        PanelSnapshot {
            status: s.status,
            status_text: s.status_text,
            indicator: s.indicator,
            controls: s.controls,
            console_len: s.console.len(),
            toasts: s.toasts.clone(),
            command_input: s.command_input.clone(),
        }
    }
}
