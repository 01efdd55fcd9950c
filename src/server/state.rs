use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::notify::NotifyService;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub notifier: Arc<NotifyService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(settings: Settings, notifier: Arc<NotifyService>) -> Self {
        Self {
            settings: Arc::new(settings),
            notifier,
            started_at: Instant::now(),
        }
    }
}
