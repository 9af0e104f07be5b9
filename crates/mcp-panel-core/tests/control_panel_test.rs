//! Integration test: Control Panel Client against a scripted backend.
//!
//! ## Scenarios
//! 1. Request funnel: backend `message` and generic fallback both surface as red toasts.
//! 2. Start/stop: "Sending..." toast, then the server reply toast with mapped severity.
//! 3. Command: optimistic echo, cleared input, JSON body, never a toast.
//! 4. Status polling: transitions, idempotence, failures keep last-known state,
//!    null or non-string status means offline.
//! 5. Console polling: gated on online state, lines appended in order, null lines ignored.
//! 6. initialize(): welcome lines, immediate status check, poller cadence, no overlap,
//!    a hung first check does not hold back the pollers.

use async_trait::async_trait;
use mcp_panel_core::{
    ApiRequest, ControlPanel, PanelConfig, PanelError, PanelModel, RawResponse,
    ToastSeverity, Transport,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Scripted backend
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Reply {
    status: u16,
    body: String,
    delay: Duration,
}

impl Reply {
    fn ok(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<HashMap<String, Reply>>,
    log: Mutex<Vec<ApiRequest>>,
    hang_once: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn reply(&self, path: &str, reply: Reply) {
        self.replies.lock().insert(path.to_string(), reply);
    }

    fn online(&self) {
        self.reply("/api/status", Reply::ok(json!({ "status": "Online" })));
    }

    fn offline(&self) {
        self.reply("/api/status", Reply::ok(json!({ "status": "Offline" })));
    }

    /// The next request to `path` never completes.
    fn hang_next(&self, path: &str) {
        self.hang_once.lock().push(path.to_string());
    }

    fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.log
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedBackend {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, PanelError> {
        let reply = self
            .replies
            .lock()
            .get(&request.path)
            .cloned()
            .unwrap_or_else(|| Reply::raw(404, r#"{"message":"no route"}"#));
        let hang = {
            let mut hangs = self.hang_once.lock();
            match hangs.iter().position(|p| *p == request.path) {
                Some(i) => {
                    hangs.remove(i);
                    true
                }
                None => false,
            }
        };
        self.log.lock().push(request);
        if hang {
            std::future::pending::<()>().await;
        }

        // Only delayed (slow) endpoints are tracked for overlap.
        if !reply.delay.is_zero() {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(reply.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        Ok(RawResponse {
            status: reply.status,
            body: reply.body.into_bytes(),
        })
    }
}

fn panel(backend: &Arc<ScriptedBackend>) -> Arc<ControlPanel> {
    let config = PanelConfig::default();
    let model = PanelModel::new(config.toast_ttl());
    ControlPanel::new(backend.clone(), model, &config)
}

// ===========================================================================
// 1. Request funnel
// ===========================================================================

#[tokio::test]
async fn error_message_from_backend_is_toasted() {
    let backend = ScriptedBackend::new();
    backend.reply("/api/start", Reply::raw(500, r#"{"message":"disk full"}"#));
    let panel = panel(&backend);

    panel.handle_start_server().await;

    let toasts = panel.model().toasts();
    let last = toasts.last().expect("error toast");
    assert_eq!(last.message, "disk full");
    assert_eq!(last.severity, ToastSeverity::Error);
}

#[tokio::test]
async fn unparsable_error_body_falls_back_to_status_code() {
    let backend = ScriptedBackend::new();
    backend.reply("/api/status", Reply::raw(500, "Internal Server Error"));
    let panel = panel(&backend);

    panel.poll_status().await;

    let toasts = panel.model().toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].message, "HTTP error! status: 500");
    assert_eq!(toasts[0].severity, ToastSeverity::Error);
}

#[tokio::test]
async fn malformed_success_body_is_a_failure() {
    let backend = ScriptedBackend::new();
    backend.reply("/api/status", Reply::raw(200, "not json"));
    let panel = panel(&backend);

    panel.poll_status().await;

    let toasts = panel.model().toasts();
    assert_eq!(toasts.len(), 1);
    assert!(toasts[0].message.starts_with("Invalid JSON in response"));
}

// ===========================================================================
// 2. Start / stop
// ===========================================================================

#[tokio::test]
async fn start_shows_sending_then_server_reply() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "/api/start",
        Reply::ok(json!({ "status": "success", "message": "Server starting..." })),
    );
    let panel = panel(&backend);

    panel.handle_start_server().await;

    let toasts = panel.model().toasts();
    assert_eq!(toasts.len(), 2);
    assert_eq!(toasts[0].message, "Sending start command...");
    assert_eq!(toasts[0].severity, ToastSeverity::Info);
    assert_eq!(toasts[1].message, "Server starting...");
    assert_eq!(toasts[1].severity, ToastSeverity::Success);

    let sent = backend.requests_to("/api/start");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, reqwest::Method::POST);
    assert!(sent[0].body.is_none());
}

#[tokio::test]
async fn stop_with_unknown_status_uses_info_style() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "/api/stop",
        Reply::ok(json!({ "status": "stopping", "message": "Server stopping..." })),
    );
    let panel = panel(&backend);

    panel.handle_stop_server().await;

    let toasts = panel.model().toasts();
    assert_eq!(toasts[0].message, "Sending stop command...");
    assert_eq!(toasts[1].message, "Server stopping...");
    assert_eq!(toasts[1].severity, ToastSeverity::Info);
}

// ===========================================================================
// 3. Command
// ===========================================================================

#[tokio::test]
async fn command_is_echoed_cleared_and_posted_without_toast() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "/api/command",
        Reply::ok(json!({ "status": "success", "message": "Command sent." })),
    );
    let panel = panel(&backend);
    panel.model().set_command_input("status");

    panel.handle_send_command().await;

    assert_eq!(panel.model().console_lines(), vec!["> status"]);
    assert_eq!(panel.model().command_input(), "");
    let sent = backend.requests_to("/api/command");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, reqwest::Method::POST);
    assert_eq!(sent[0].body, Some(json!({ "command": "status" })));
    assert!(panel.model().toasts().is_empty());
}

#[tokio::test]
async fn failed_command_is_still_silent() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "/api/command",
        Reply::raw(400, r#"{"status":"error","message":"Server is not running."}"#),
    );
    let panel = panel(&backend);
    panel.model().set_command_input("  list ");

    panel.handle_send_command().await;

    assert_eq!(panel.model().console_lines(), vec!["> list"]);
    assert!(panel.model().toasts().is_empty());
}

#[tokio::test]
async fn blank_command_is_a_no_op() {
    let backend = ScriptedBackend::new();
    let panel = panel(&backend);
    panel.model().set_command_input("   ");

    panel.handle_send_command().await;

    assert!(panel.model().console_lines().is_empty());
    assert!(backend.requests_to("/api/command").is_empty());
}

// ===========================================================================
// 4. Status polling
// ===========================================================================

#[tokio::test]
async fn status_transitions_follow_the_backend() {
    let backend = ScriptedBackend::new();
    let panel = panel(&backend);

    backend.online();
    panel.poll_status().await;
    assert!(panel.model().is_server_online());
    assert!(panel.model().snapshot().controls.stop_enabled);

    backend.reply("/api/status", Reply::ok(json!({ "status": "Starting" })));
    panel.poll_status().await;
    assert!(!panel.model().is_server_online());
    assert!(panel.model().snapshot().controls.start_enabled);
}

#[tokio::test]
async fn repeated_status_polls_do_not_flicker() {
    let backend = ScriptedBackend::new();
    backend.online();
    let panel = panel(&backend);

    panel.poll_status().await;
    let first = panel.model().snapshot();
    for _ in 0..3 {
        panel.poll_status().await;
        assert_eq!(panel.model().snapshot(), first);
    }
}

#[tokio::test]
async fn failed_status_poll_keeps_last_known_state() {
    let backend = ScriptedBackend::new();
    backend.online();
    let panel = panel(&backend);
    panel.poll_status().await;

    backend.reply("/api/status", Reply::raw(503, ""));
    panel.poll_status().await;

    assert!(panel.model().is_server_online());
    assert_eq!(panel.model().toasts().len(), 1);
}

#[tokio::test]
async fn null_or_non_string_status_means_offline_without_toast() {
    let backend = ScriptedBackend::new();
    let panel = panel(&backend);

    for body in [json!({ "status": null }), json!({ "status": 1 }), json!({})] {
        backend.online();
        panel.poll_status().await;
        assert!(panel.model().is_server_online());

        backend.reply("/api/status", Reply::ok(body.clone()));
        panel.poll_status().await;
        assert!(!panel.model().is_server_online(), "{}", body);
        assert_eq!(panel.model().snapshot().status_text, "Offline");
    }
    assert!(panel.model().toasts().is_empty());
}

// ===========================================================================
// 5. Console polling
// ===========================================================================

#[tokio::test]
async fn console_poll_is_skipped_while_offline() {
    let backend = ScriptedBackend::new();
    backend.reply("/api/console", Reply::ok(json!({ "lines": ["never"] })));
    let panel = panel(&backend);

    for _ in 0..5 {
        panel.poll_console().await;
    }

    assert!(backend.requests_to("/api/console").is_empty());
    assert!(panel.model().console_lines().is_empty());
}

#[tokio::test]
async fn console_lines_are_appended_in_order() {
    let backend = ScriptedBackend::new();
    backend.online();
    backend.reply(
        "/api/console",
        Reply::ok(json!({ "lines": ["[Server thread/INFO]: Starting", "Done (3.2s)!", "<b>raw</b>"] })),
    );
    let panel = panel(&backend);
    panel.poll_status().await;

    panel.poll_console().await;

    assert_eq!(
        panel.model().console_lines(),
        vec!["[Server thread/INFO]: Starting", "Done (3.2s)!", "<b>raw</b>"]
    );
}

#[tokio::test]
async fn null_console_lines_are_a_no_op() {
    let backend = ScriptedBackend::new();
    backend.online();
    backend.reply("/api/console", Reply::ok(json!({ "lines": ["before"] })));
    let panel = panel(&backend);
    panel.poll_status().await;
    panel.poll_console().await;

    backend.reply("/api/console", Reply::ok(json!({ "lines": null })));
    panel.poll_console().await;

    assert_eq!(panel.model().console_lines(), vec!["before"]);
    assert!(panel.model().toasts().is_empty());
    assert_eq!(backend.requests_to("/api/console").len(), 2);
}

// ===========================================================================
// 6. initialize()
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn initialize_prints_welcome_and_checks_status_once() {
    let backend = ScriptedBackend::new();
    backend.offline();
    let panel = panel(&backend);

    let pollers = panel.initialize();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(
        panel.model().console_lines(),
        vec!["Welcome to the MCP Control Panel.", "Checking server status..."]
    );
    assert_eq!(backend.requests_to("/api/status").len(), 1);
    assert!(pollers.is_running());
    pollers.shutdown();
}

#[tokio::test(start_paused = true)]
async fn hung_first_status_check_does_not_hold_back_pollers() {
    let backend = ScriptedBackend::new();
    backend.offline();
    backend.hang_next("/api/status");
    let panel = panel(&backend);

    let pollers = panel.initialize();
    tokio::time::sleep(Duration::from_millis(10_000)).await;

    // hung initial check + ticks at 3s, 6s, 9s
    assert!(backend.requests_to("/api/status").len() >= 3);
    assert_eq!(backend.requests_to("/api/status").len(), 4);
    assert!(pollers.is_running());
    pollers.shutdown();
}

#[tokio::test(start_paused = true)]
async fn offline_server_never_sees_console_requests() {
    let backend = ScriptedBackend::new();
    backend.offline();
    let panel = panel(&backend);

    let pollers = panel.initialize();
    tokio::time::sleep(Duration::from_millis(10_500)).await;

    assert!(backend.requests_to("/api/console").is_empty());
    // initial check + ticks at 3s, 6s, 9s
    assert_eq!(backend.requests_to("/api/status").len(), 4);
    pollers.shutdown();
}

#[tokio::test(start_paused = true)]
async fn online_server_is_polled_every_second() {
    let backend = ScriptedBackend::new();
    backend.online();
    backend.reply("/api/console", Reply::ok(json!({ "lines": ["tick"] })));
    let panel = panel(&backend);

    let pollers = panel.initialize();
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    assert_eq!(backend.requests_to("/api/console").len(), 3);
    let ticks = panel
        .model()
        .console_lines()
        .iter()
        .filter(|l| l.as_str() == "tick")
        .count();
    assert_eq!(ticks, 3);
    pollers.shutdown();
}

#[tokio::test(start_paused = true)]
async fn slow_console_endpoint_never_has_two_polls_in_flight() {
    let backend = ScriptedBackend::new();
    backend.online();
    backend.reply(
        "/api/console",
        Reply::ok(json!({ "lines": [] })).delayed(Duration::from_millis(2_500)),
    );
    let panel = panel(&backend);

    let pollers = panel.initialize();
    tokio::time::sleep(Duration::from_millis(8_000)).await;

    assert!(backend.requests_to("/api/console").len() >= 2);
    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
    pollers.shutdown();
}
