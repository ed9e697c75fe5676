//! AI configuration (HuggingFace inference)

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::qa::HuggingFaceSettings;

/// AI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// HuggingFace API key
    pub hugging_face_api_key: Secret<String>,

    /// Inference API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model for document retrieval
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Extractive question-answering model
    #[serde(default = "default_qa_model")]
    pub qa_model: String,

    /// Chat model for off-flow assistant replies
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Whether free-form text in the entry state gets an assistant reply
    #[serde(default = "default_assistant_enabled")]
    pub assistant_enabled: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build HuggingFace adapter settings from this configuration
    pub fn hugging_face_settings(&self, pdftotext_bin: String) -> HuggingFaceSettings {
        let mut settings = HuggingFaceSettings::new(self.hugging_face_api_key.clone());
        settings.base_url = self.base_url.clone();
        settings.embedding_model = self.embedding_model.clone();
        settings.qa_model = self.qa_model.clone();
        settings.chat_model = self.chat_model.clone();
        settings.pdftotext_bin = pdftotext_bin;
        settings.timeout = self.timeout();
        settings
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hugging_face_api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("AI__HUGGING_FACE_API_KEY"));
        }
        if !self.base_url.starts_with("http") {
            return Err(ValidationError::InvalidUrl("ai.base_url"));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_qa_model() -> String {
    "deepset/roberta-base-squad2".to_string()
}

fn default_chat_model() -> String {
    "mistralai/Mistral-7B-Instruct-v0.2".to_string()
}

fn default_assistant_enabled() -> bool {
    true
}

fn default_timeout() -> u64 {
    60
}
