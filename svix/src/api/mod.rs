pub mod client;
pub mod error;
pub mod event_types;
pub mod ingest;
pub mod management;
pub mod operational_webhooks;

pub use client::{new_idempotency_key, Client, IDEMPOTENCY_KEY_HEADER};
pub use error::ApiError;

/// Percent-encodes one path segment
pub(crate) fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}
