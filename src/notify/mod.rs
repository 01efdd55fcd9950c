//! Notification fan-out: submission queue, dispatch worker and the
//! destination capability implemented by concrete channels.

mod destination;
pub mod queue;
mod request;
mod service;

pub use destination::{Destination, DestinationError};
pub use queue::PushOutcome;
pub use request::{Comment, Locator, NotificationRequest, User};
pub use service::{NotifyService, NotifyStats, NotifyStatsSnapshot, ShutdownPolicy};
