//! Document Q&A and assistant adapters backed by HuggingFace inference.

mod hugging_face;

pub use hugging_face::{HuggingFaceAssistant, HuggingFaceQa, HuggingFaceSettings};
