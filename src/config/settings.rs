use std::collections::HashMap;
use std::env;
use std::time::Duration;

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::notify::ShutdownPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds to wait for the notifier to close on shutdown
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Required `X-API-Key` value for event intake; open when unset
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// When false the service runs with no destinations
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum notifications waiting for dispatch
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// "discard" (default) or "drain"
    #[serde(default = "default_shutdown_policy")]
    pub shutdown_policy: String,
    /// Upper bound on queue draining when the policy is "drain"
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_seconds: u64,
    /// Emit every notification as a log event
    #[serde(default)]
    pub log_destination: bool,
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_webhook_timeout")]
    pub timeout_seconds: u64,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_shutdown_timeout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    100
}

fn default_shutdown_policy() -> String {
    "discard".to_string()
}

fn default_drain_timeout() -> u64 {
    5
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Self::defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // APP_SERVER__PORT, APP_NOTIFY__QUEUE_CAPACITY, APP_API__KEY, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Builder preloaded with default values
    pub(crate) fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("server.shutdown_timeout_seconds", default_shutdown_timeout() as i64)?
            .set_default("notify.enabled", true)?
            .set_default("notify.queue_capacity", default_queue_capacity() as i64)?
            .set_default("notify.shutdown_policy", default_shutdown_policy())?
            .set_default("notify.drain_timeout_seconds", default_drain_timeout() as i64)?
            .set_default("logging.format", default_log_format())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl NotifyConfig {
    /// Parse the configured shutdown policy
    pub fn shutdown_policy(&self) -> Result<ShutdownPolicy, ConfigError> {
        match self.shutdown_policy.to_ascii_lowercase().as_str() {
            "discard" => Ok(ShutdownPolicy::Discard),
            "drain" => Ok(ShutdownPolicy::Drain {
                timeout: Duration::from_secs(self.drain_timeout_seconds),
            }),
            other => Err(ConfigError::Message(format!(
                "unknown notify.shutdown_policy '{}', expected 'discard' or 'drain'",
                other
            ))),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: default_queue_capacity(),
            shutdown_policy: default_shutdown_policy(),
            drain_timeout_seconds: default_drain_timeout(),
            log_destination: false,
            webhooks: vec![],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use tokio_test::{assert_err, assert_ok};

    fn from_toml(source: &str) -> Settings {
        Settings::defaults()
            .unwrap()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_values() {
        let settings = from_toml("");
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8090);
        assert!(settings.notify.enabled);
        assert_eq!(settings.notify.queue_capacity, 100);
        assert!(settings.notify.webhooks.is_empty());
        assert_eq!(settings.logging.format, "text");
        assert!(settings.api.key.is_none());
    }

    #[test]
    fn test_webhooks_from_file() {
        let settings = from_toml(
            r#"
            [notify]
            queue_capacity = 5
            log_destination = true

            [[notify.webhooks]]
            name = "ops"
            url = "http://localhost:9000/hook"

            [notify.webhooks.headers]
            x-token = "abc"
            "#,
        );

        assert_eq!(settings.notify.queue_capacity, 5);
        assert!(settings.notify.log_destination);
        assert_eq!(settings.notify.webhooks.len(), 1);
        let hook = &settings.notify.webhooks[0];
        assert_eq!(hook.name, "ops");
        assert_eq!(hook.timeout_seconds, 10);
        assert_eq!(hook.headers.get("x-token").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_shutdown_policy_parsing() {
        let mut notify = NotifyConfig::default();
        assert_eq!(assert_ok!(notify.shutdown_policy()), ShutdownPolicy::Discard);

        notify.shutdown_policy = "Drain".to_string();
        notify.drain_timeout_seconds = 3;
        assert_eq!(
            assert_ok!(notify.shutdown_policy()),
            ShutdownPolicy::Drain {
                timeout: Duration::from_secs(3)
            }
        );

        notify.shutdown_policy = "flush".to_string();
        assert_err!(notify.shutdown_policy());
    }

    #[test]
    fn test_server_addr() {
        let settings = from_toml("[server]\nhost = \"127.0.0.1\"\nport = 9000\n");
        assert_eq!(settings.server_addr(), "127.0.0.1:9000");
    }
}
