mod settings;

pub use settings::{
    ApiConfig, LoggingConfig, NotifyConfig, ServerConfig, Settings, WebhookConfig,
};
