//! HuggingFace-backed document Q&A and assistant replies.
//!
//! The Q&A path is a small retrieval pipeline: extract the PDF's text with
//! pdftotext, split it into sentence-aligned chunks, embed chunks and
//! question with a feature-extraction model, pick the closest chunks by
//! cosine similarity, and ask an extractive QA model against that context.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::ports::{AssistantError, AssistantReplier, DocumentQa, QaError};

/// Target size for a retrieval chunk, in characters.
const CHUNK_CHARS: usize = 800;

/// Number of chunks handed to the QA model as context.
const TOP_CHUNKS: usize = 3;

/// Connection and model settings for the HuggingFace adapters.
#[derive(Debug, Clone)]
pub struct HuggingFaceSettings {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub qa_model: String,
    pub chat_model: String,
    pub pdftotext_bin: String,
    pub timeout: Duration,
}

impl HuggingFaceSettings {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api-inference.huggingface.co".into(),
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".into(),
            qa_model: "deepset/roberta-base-squad2".into(),
            chat_model: "mistralai/Mistral-7B-Instruct-v0.2".into(),
            pdftotext_bin: "pdftotext".into(),
            timeout: Duration::from_secs(60),
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), model)
    }
}

/// Shared HTTP plumbing for the inference endpoints.
struct InferenceClient {
    settings: HuggingFaceSettings,
    http: reqwest::Client,
}

impl InferenceClient {
    fn new(settings: HuggingFaceSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_default();
        Self { settings, http }
    }

    async fn post(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, InferenceFault> {
        let response = self
            .http
            .post(self.settings.model_url(model))
            .bearer_auth(self.settings.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceFault::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(InferenceFault::Inference(format!(
                "{model}: {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| InferenceFault::Inference(e.to_string()))
    }

    async fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, InferenceFault> {
        let value = self
            .post(
                &self.settings.embedding_model,
                json!({ "inputs": inputs, "options": { "wait_for_model": true } }),
            )
            .await?;
        serde_json::from_value(value)
            .map_err(|e| InferenceFault::Inference(format!("bad embedding shape: {e}")))
    }
}

/// Internal fault shared by both adapters; mapped to the port errors at the
/// trait boundary.
enum InferenceFault {
    Inference(String),
    Network(String),
}

impl From<InferenceFault> for QaError {
    fn from(fault: InferenceFault) -> Self {
        match fault {
            InferenceFault::Inference(m) => QaError::Inference(m),
            InferenceFault::Network(m) => QaError::Network(m),
        }
    }
}

impl From<InferenceFault> for AssistantError {
    fn from(fault: InferenceFault) -> Self {
        match fault {
            InferenceFault::Inference(m) => AssistantError::Inference(m),
            InferenceFault::Network(m) => AssistantError::Network(m),
        }
    }
}

/// [`DocumentQa`] over HuggingFace feature-extraction and extractive QA
/// models.
pub struct HuggingFaceQa {
    client: InferenceClient,
}

impl HuggingFaceQa {
    pub fn new(settings: HuggingFaceSettings) -> Self {
        Self {
            client: InferenceClient::new(settings),
        }
    }

    async fn extract_text(&self, document: &Path) -> Result<String, QaError> {
        let output = tokio::process::Command::new(&self.client.settings.pdftotext_bin)
            .arg(document)
            .arg("-") // stdout
            .output()
            .await
            .map_err(|e| QaError::Extraction(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(QaError::Extraction(format!(
                "pdftotext exit {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(QaError::Extraction(
                "document contains no extractable text".into(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl DocumentQa for HuggingFaceQa {
    #[instrument(skip(self, question), fields(document = %document.display()))]
    async fn answer(&self, document: &Path, question: &str) -> Result<String, QaError> {
        let text = self.extract_text(document).await?;
        let chunks = chunk_text(&text, CHUNK_CHARS);
        debug!(chunks = chunks.len(), "chunked document for retrieval");

        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let chunk_vectors = self.client.embed(&refs).await.map_err(QaError::from)?;
        let question_vectors = self.client.embed(&[question]).await.map_err(QaError::from)?;
        let question_vector = question_vectors
            .first()
            .ok_or_else(|| QaError::Inference("empty question embedding".into()))?;

        let context = top_chunks(&chunks, &chunk_vectors, question_vector, TOP_CHUNKS).join("\n\n");

        let value = self
            .client
            .post(
                &self.client.settings.qa_model,
                json!({
                    "inputs": { "question": question, "context": context },
                    "options": { "wait_for_model": true },
                }),
            )
            .await
            .map_err(QaError::from)?;

        #[derive(Deserialize)]
        struct QaAnswer {
            answer: String,
        }
        let parsed: QaAnswer = serde_json::from_value(value)
            .map_err(|e| QaError::Inference(format!("bad QA response: {e}")))?;
        Ok(parsed.answer)
    }
}

/// [`AssistantReplier`] over a HuggingFace chat model, instructed to keep
/// replies short and scoped to what the bot can actually do.
pub struct HuggingFaceAssistant {
    client: InferenceClient,
}

impl HuggingFaceAssistant {
    pub fn new(settings: HuggingFaceSettings) -> Self {
        Self {
            client: InferenceClient::new(settings),
        }
    }

    fn prompt(query: &str) -> String {
        format!(
            "You are a WhatsApp assistant for a file storage bot. You can help \
             users store files, retrieve stored files, convert documents and \
             images, and answer questions about PDF documents. Reply to the \
             user's message in at most two short sentences, steering them \
             toward those capabilities.\n\nUser: {query}\nAssistant:"
        )
    }
}

#[async_trait]
impl AssistantReplier for HuggingFaceAssistant {
    async fn reply(&self, query: &str) -> Result<String, AssistantError> {
        let value = self
            .client
            .post(
                &self.client.settings.chat_model,
                json!({
                    "inputs": Self::prompt(query),
                    "parameters": { "max_new_tokens": 120, "return_full_text": false },
                    "options": { "wait_for_model": true },
                }),
            )
            .await
            .map_err(AssistantError::from)?;

        #[derive(Deserialize)]
        struct Generated {
            generated_text: String,
        }
        let parsed: Vec<Generated> = serde_json::from_value(value)
            .map_err(|e| AssistantError::Inference(format!("bad generation response: {e}")))?;
        let reply = parsed
            .into_iter()
            .next()
            .map(|g| g.generated_text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AssistantError::Inference("empty generation".into()))?;
        Ok(reply)
    }
}

/// Splits text into chunks of roughly `target` characters, preferring to cut
/// at sentence boundaries so retrieval context stays readable.
fn chunk_text(text: &str, target: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(text) {
        if !current.is_empty() && current.len() + sentence.len() > target {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence.trim());
        // A single run-on sentence longer than the target becomes its own
        // chunk rather than being split mid-word.
        if current.len() >= target {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?', '\n'])
        .filter(|s| !s.trim().is_empty())
}

/// Ranks chunks by cosine similarity to the query vector and returns the
/// top `limit` in similarity order.
fn top_chunks<'a>(
    chunks: &'a [String],
    vectors: &[Vec<f32>],
    query: &[f32],
    limit: usize,
) -> Vec<&'a str> {
    let mut scored: Vec<(f32, &str)> = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| (cosine_similarity(vector, query), chunk.as_str()))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(limit).map(|(_, c)| c).collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
