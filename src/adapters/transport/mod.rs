//! Chat transport adapters.

mod twilio;

pub use twilio::{TwilioSettings, TwilioTransport};
