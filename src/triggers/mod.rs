//! Inbound domain events that produce notifications.

mod http;

pub use http::{submit_comment, SubmitCommentResponse};
