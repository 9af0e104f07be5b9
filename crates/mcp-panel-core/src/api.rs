//! Backend API: transport seam, the request funnel, and response bodies.

use crate::error::PanelError;
use crate::model::{PanelModel, ServerStatus, ToastSeverity};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const START_PATH: &str = "/api/start";
pub const STOP_PATH: &str = "/api/stop";
pub const COMMAND_PATH: &str = "/api/command";
pub const STATUS_PATH: &str = "/api/status";
pub const CONSOLE_PATH: &str = "/api/console";

/// A request against the backend, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: None,
        }
    }

    /// Attaches a JSON body (sent with `Content-Type: application/json`).
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status code and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request to the backend and back. Only transport-level failures are errors;
/// HTTP error statuses come back as a `RawResponse`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, PanelError>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, PanelError> {
        let base_url = reqwest::Url::parse(base_url).map_err(|e| PanelError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    fn resolve(&self, path: &str) -> Result<reqwest::Url, PanelError> {
        self.base_url.join(path).map_err(|e| PanelError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, PanelError> {
        let url = self.resolve(&request.path)?;
        let mut builder = self.client.request(request.method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let res = builder.send().await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}

/// What a failed request leaves behind besides the log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureNotice {
    /// Red toast with the failure message.
    Toast,
    /// Log only.
    Quiet,
}

/// The request funnel. Every backend call goes through [`ApiClient::request`], which
/// never returns an error: failures are logged, optionally toasted, and become `None`.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    model: Arc<PanelModel>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, model: Arc<PanelModel>) -> Self {
        Self { transport, model }
    }

    pub async fn request<R: DeserializeOwned>(&self, request: ApiRequest) -> Option<R> {
        self.request_with(request, FailureNotice::Toast).await
    }

    pub async fn request_with<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
        notice: FailureNotice,
    ) -> Option<R> {
        let method = request.method.clone();
        let path = request.path.clone();
        match self.try_request(request).await {
            Ok(body) => Some(body),
            Err(e) => {
                let message = e.to_string();
                tracing::error!(%method, %path, "API request failed: {}", message);
                if notice == FailureNotice::Toast {
                    self.model.show_toast(message, ToastSeverity::Error);
                }
                None
            }
        }
    }

    async fn try_request<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, PanelError> {
        let res = self.transport.send(request).await?;
        if !res.is_success() {
            return Err(PanelError::from_status(res.status, &res.body));
        }
        Ok(serde_json::from_slice(&res.body)?)
    }
}

/// `/api/start` and `/api/stop` reply. `status` doubles as the toast severity.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "severity_from_status")]
    pub status: ToastSeverity,
}

/// `/api/status` reply. Any value other than the string `"Online"`, including null or a
/// missing field, means offline.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl StatusResponse {
    pub fn server_status(&self) -> ServerStatus {
        self.status
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map(ServerStatus::from_status_str)
            .unwrap_or_default()
    }
}

/// `/api/console` reply: lines produced since the previous poll. Null means none.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub lines: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn severity_from_status<'de, D>(deserializer: D) -> Result<ToastSeverity, D::Error>
where
    D: Deserializer<'de>,
{
    let status = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(status
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .map(ToastSeverity::from_status_str)
        .unwrap_or_default())
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest<'a> {
    pub command: &'a str,
}
