//! Sentence-embedding client.
//!
//! Code lists and queries are embedded by an OpenAI-compatible
//! `/v1/embeddings` endpoint behind the [`Embedder`] trait, so tests and
//! other backends can stand in for it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::completion::provider_message;

pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Sentence-embedding backend: one vector per input string.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// OpenAI-compatible `/v1/embeddings` client.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, EmbedError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let mut request = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: EmbedResponse = response.json().await?;
        let vectors = into_ordered_vectors(parsed.data);
        if vectors.len() != texts.len() {
            return Err(EmbedError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }

        debug!(model = %self.model, count = vectors.len(), "embedded texts");
        Ok(vectors)
    }
}

fn api_error(status: u16, body: &str) -> EmbedError {
    EmbedError::Api {
        status,
        message: provider_message(body),
    }
}

/// Servers may return items out of order; `index` restores input order when present.
fn into_ordered_vectors(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }
    data.into_iter().map(|d| d.embedding).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_reordered_by_index() {
        let json = r#"{"data": [
            {"index": 1, "embedding": [0.0, 1.0]},
            {"index": 0, "embedding": [1.0, 0.0]}
        ]}"#;
        let parsed: EmbedResponse = serde_json::from_str(json).unwrap();
        let vectors = into_ordered_vectors(parsed.data);
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_response_without_index_keeps_order() {
        let json = r#"{"data": [{"embedding": [0.5]}, {"embedding": [0.25]}]}"#;
        let parsed: EmbedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(into_ordered_vectors(parsed.data), vec![vec![0.5], vec![0.25]]);
    }

    #[test]
    fn test_api_error_extracts_provider_message() {
        let body = r#"{"error": {"message": "model not found", "type": "invalid_request_error"}}"#;
        let err = api_error(404, body);
        assert_eq!(
            err.to_string(),
            "embedding API error (status 404): model not found"
        );
    }

    #[test]
    fn test_api_error_keeps_plain_body() {
        let err = api_error(502, "Bad Gateway");
        assert!(matches!(err, EmbedError::Api { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        // Unroutable address: an actual request would fail.
        let embedder = HttpEmbedder::new("http://127.0.0.1:9", None, "m").unwrap();
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}
