//! Control Panel Client: user-action handlers, pollers and start-up.

use crate::api::{
    ActionResponse, ApiClient, ApiRequest, CommandRequest, ConsoleResponse, FailureNotice,
    HttpTransport, StatusResponse, Transport, COMMAND_PATH, CONSOLE_PATH, START_PATH,
    STATUS_PATH, STOP_PATH,
};
use crate::config::PanelConfig;
use crate::error::PanelError;
use crate::model::{PanelModel, ToastSeverity, CHECKING_STATUS_LINE, WELCOME_LINE};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct ControlPanel {
    api: ApiClient,
    model: Arc<PanelModel>,
    status_interval: Duration,
    console_interval: Duration,
}

impl ControlPanel {
    pub fn new(transport: Arc<dyn Transport>, model: Arc<PanelModel>, config: &PanelConfig) -> Arc<Self> {
        Arc::new(Self {
            api: ApiClient::new(transport, Arc::clone(&model)),
            model,
            status_interval: config.status_interval(),
            console_interval: config.console_interval(),
        })
    }

    /// Builds the model and an HTTP transport from config.
    pub fn from_config(config: &PanelConfig) -> Result<Arc<Self>, PanelError> {
        let transport = HttpTransport::new(&config.base_url, config.request_timeout())?;
        let model = PanelModel::new(config.toast_ttl());
        Ok(Self::new(Arc::new(transport), model, config))
    }

    pub fn model(&self) -> &Arc<PanelModel> {
        &self.model
    }

    pub async fn handle_start_server(&self) {
        self.server_action("start", START_PATH).await;
    }

    pub async fn handle_stop_server(&self) {
        self.server_action("stop", STOP_PATH).await;
    }

    async fn server_action(&self, verb: &str, path: &str) {
        tracing::info!(action = verb, "sending server action");
        self.model
            .show_toast(format!("Sending {} command...", verb), ToastSeverity::Info);
        if let Some(data) = self
            .api
            .request::<ActionResponse>(ApiRequest::post(path))
            .await
        {
            self.model.show_toast(data.message, data.status);
        }
    }

    /// Echoes and clears the command input before the request goes out. The outcome is
    /// never toasted; results show up through the console poller.
    pub async fn handle_send_command(&self) {
        let Some(command) = self.model.take_command() else {
            return;
        };
        self.model.append_to_console(format!("> {}", command));
        tracing::info!(%command, "forwarding command");

        let body = match serde_json::to_value(CommandRequest { command: &command }) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "could not encode command");
                return;
            }
        };
        // response is not surfaced; command output arrives through the console poller
        self.api
            .request_with::<serde_json::Value>(
                ApiRequest::post(COMMAND_PATH).json(body),
                FailureNotice::Quiet,
            )
            .await;
    }

    /// A failed request leaves the last-known state untouched.
    pub async fn poll_status(&self) {
        if let Some(data) = self
            .api
            .request::<StatusResponse>(ApiRequest::get(STATUS_PATH))
            .await
        {
            let status = data.server_status();
            tracing::debug!(status = status.label(), "status polled");
            self.model.update_ui(status.is_online());
        }
    }

    /// Does nothing, not even a request, while the server is known to be offline.
    pub async fn poll_console(&self) {
        if !self.model.is_server_online() {
            return;
        }
        if let Some(data) = self
            .api
            .request::<ConsoleResponse>(ApiRequest::get(CONSOLE_PATH))
            .await
        {
            for line in data.lines {
                self.model.append_to_console(line);
            }
        }
    }

    /// Prints the welcome lines, fires one status check, then starts both pollers.
    ///
    /// Returns at once: the first check runs as its own task, so a backend that never
    /// answers it cannot hold back the timers or the caller.
    pub fn initialize(self: &Arc<Self>) -> Pollers {
        self.model.append_to_console(WELCOME_LINE);
        self.model.append_to_console(CHECKING_STATUS_LINE);

        let first_check = {
            let panel = Arc::clone(self);
            tokio::spawn(async move { panel.poll_status().await })
        };
        let status = {
            let panel = Arc::clone(self);
            let period = self.status_interval;
            tokio::spawn(async move {
                let mut interval = poll_interval(period);
                loop {
                    interval.tick().await;
                    panel.poll_status().await;
                }
            })
        };
        let console = {
            let panel = Arc::clone(self);
            let period = self.console_interval;
            tokio::spawn(async move {
                let mut interval = poll_interval(period);
                loop {
                    interval.tick().await;
                    panel.poll_console().await;
                }
            })
        };
        tracing::info!(
            status_interval_ms = self.status_interval.as_millis() as u64,
            console_interval_ms = self.console_interval.as_millis() as u64,
            "pollers started"
        );

        Pollers {
            first_check,
            status,
            console,
        }
    }
}

/// First tick one period from now; a tick that falls due while the previous poll is
/// still running is delayed, so one endpoint never has two polls in flight.
fn poll_interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Handles of the start-up status check and the two recurring pollers.
pub struct Pollers {
    first_check: JoinHandle<()>,
    status: JoinHandle<()>,
    console: JoinHandle<()>,
}

impl Pollers {
    pub fn shutdown(self) {
        self.first_check.abort();
        self.status.abort();
        self.console.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.status.is_finished() && !self.console.is_finished()
    }
}
