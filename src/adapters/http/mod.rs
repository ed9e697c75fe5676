//! HTTP adapters - the inbound webhook surface.

mod webhook;

pub use webhook::{webhook_router, EventSink, WebhookState};
