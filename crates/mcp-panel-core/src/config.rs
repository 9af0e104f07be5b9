//! Control panel configuration.
//!
//! | Key (env `MCP_PANEL__<KEY>`) | Default | Description |
//! |-----|---------|-------------|
//! | base_url | http://127.0.0.1:5000 | Backend serving the `/api/*` endpoints. |
//! | status_interval_ms | 3000 | Period of the status poller. |
//! | console_interval_ms | 1000 | Period of the console poller. |
//! | toast_ttl_ms | 4000 | Lifetime of a toast notification. |
//! | request_timeout_ms | unset | Per-request timeout; unset means wait forever. |
//! | window_width / window_height | 760 / 560 | Desktop window size. |

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const MIN_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub base_url: String,
    pub status_interval_ms: u64,
    pub console_interval_ms: u64,
    pub toast_ttl_ms: u64,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            status_interval_ms: 3000,
            console_interval_ms: 1000,
            toast_ttl_ms: 4000,
            request_timeout_ms: None,
            window_width: 760.0,
            window_height: 560.0,
        }
    }
}

impl PanelConfig {
    /// Load config from file and environment. Precedence: env `MCP_PANEL__*` > file
    /// (`MCP_PANEL_CONFIG` path, else `config/control-panel.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("MCP_PANEL_CONFIG")
            .unwrap_or_else(|_| "config/control-panel.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("status_interval_ms", defaults.status_interval_ms)?
            .set_default("console_interval_ms", defaults.console_interval_ms)?
            .set_default("toast_ttl_ms", defaults.toast_ttl_ms)?
            .set_default("window_width", f64::from(defaults.window_width))?
            .set_default("window_height", f64::from(defaults.window_height))?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("MCP_PANEL").separator("__"))
            .build()?;

        let loaded: Self = built.try_deserialize()?;
        Ok(loaded.normalized())
    }

    /// Clamps intervals so a typo cannot turn the pollers into a busy loop.
    fn normalized(mut self) -> Self {
        self.status_interval_ms = self.status_interval_ms.max(MIN_INTERVAL_MS);
        self.console_interval_ms = self.console_interval_ms.max(MIN_INTERVAL_MS);
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn console_interval(&self) -> Duration {
        Duration::from_millis(self.console_interval_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
