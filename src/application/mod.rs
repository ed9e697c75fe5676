//! Application layer - orchestrates domain logic against the ports.

mod engine;

pub use engine::ConversationEngine;
