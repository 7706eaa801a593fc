//! Nearest-code suggestions by cosine similarity.
//!
//! Candidate codes are embedded once when the index is built. Each query
//! embeds only the typed profession and scores it against every code.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::embedding::{EmbedError, Embedder};

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("query text is empty")]
    EmptyQuery,

    #[error(transparent)]
    Embed(#[from] EmbedError),
}

/// A candidate code and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub code: String,
    pub score: f32,
}

/// Distinct codes with their pre-computed embeddings.
pub struct CodeIndex {
    codes: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl CodeIndex {
    /// Embed every code once.
    pub async fn build(codes: Vec<String>, embedder: &dyn Embedder) -> Result<Self, EmbedError> {
        let embeddings = embedder.embed(&codes).await?;
        if embeddings.len() != codes.len() {
            return Err(EmbedError::CountMismatch {
                expected: codes.len(),
                actual: embeddings.len(),
            });
        }
        info!(codes = codes.len(), "built code index");
        Ok(Self { codes, embeddings })
    }

    /// Build from already-computed vectors. Extra codes or vectors are dropped.
    pub fn from_parts(codes: Vec<String>, embeddings: Vec<Vec<f32>>) -> Self {
        let n = codes.len().min(embeddings.len());
        let mut codes = codes;
        let mut embeddings = embeddings;
        codes.truncate(n);
        embeddings.truncate(n);
        Self { codes, embeddings }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Top `n` codes by descending similarity. Ties keep index order.
    pub fn rank(&self, query: &[f32], n: usize) -> Vec<Suggestion> {
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, emb)| (i, cosine_sim(query, emb)))
            .collect();

        // Stable sort: equal scores stay in code order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(n)
            .map(|(i, score)| Suggestion {
                code: self.codes[i].clone(),
                score,
            })
            .collect()
    }

    /// Embed `query` and return the `n` closest codes.
    pub async fn suggest(
        &self,
        query: &str,
        n: usize,
        embedder: &dyn Embedder,
    ) -> Result<Vec<Suggestion>, SuggestError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SuggestError::EmptyQuery);
        }
        if n == 0 || self.is_empty() {
            return Ok(vec![]);
        }

        let vectors = embedder.embed(&[query.to_string()]).await?;
        let query_vec = vectors
            .into_iter()
            .next()
            .ok_or(EmbedError::CountMismatch {
                expected: 1,
                actual: 0,
            })?;
        Ok(self.rank(&query_vec, n))
    }
}

/// Lowest possible cosine similarity. Vectors that cannot be scored get this.
const UNSCORABLE: f32 = -1.0;

/// Cosine similarity. Zero vectors score 0; non-finite results rank last.
fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a * norm_b);
    if sim.is_finite() {
        sim
    } else {
        UNSCORABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps known strings to fixed 3-dim vectors and counts calls.
    struct TableEmbedder {
        calls: AtomicUsize,
    }

    impl TableEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn vector(text: &str) -> Vec<f32> {
            match text {
                "Registered Nurses" => vec![1.0, 0.0, 0.0],
                "Nursing Assistants" => vec![0.8, 0.6, 0.0],
                "Welders" => vec![0.0, 0.0, 1.0],
                "Chefs and Head Cooks" => vec![0.0, 1.0, 0.0],
                "nurse" => vec![0.9, 0.1, 0.0],
                _ => vec![0.0, 0.0, 0.0],
            }
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }
    }

    fn codes() -> Vec<String> {
        vec![
            "Chefs and Head Cooks".to_string(),
            "Nursing Assistants".to_string(),
            "Registered Nurses".to_string(),
            "Welders".to_string(),
        ]
    }

    #[test]
    fn test_cosine_sim_basic() {
        assert!((cosine_sim(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_sim(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_sim(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_sim(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_sim_non_finite_is_lowest() {
        assert_eq!(cosine_sim(&[1.0, 0.0], &[f32::NAN, 1.0]), UNSCORABLE);
        assert_eq!(cosine_sim(&[1.0, 0.0], &[f32::INFINITY, 1.0]), UNSCORABLE);
    }

    #[test]
    fn test_rank_with_nan_embeddings_puts_them_last() {
        let codes: Vec<String> = (0..64).map(|i| format!("code-{i}")).collect();
        let embeddings: Vec<Vec<f32>> = (0..64)
            .map(|i| match i % 3 {
                0 => vec![f32::NAN, 1.0],
                1 => vec![1.0, 0.0],
                _ => vec![0.0, 1.0],
            })
            .collect();
        let index = CodeIndex::from_parts(codes, embeddings);

        let ranked = index.rank(&[1.0, 0.0], 10);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].code, "code-1");
        assert!(ranked.iter().all(|s| s.score.is_finite()));

        let all = index.rank(&[1.0, 0.0], 64);
        assert_eq!(all.len(), 64);
        assert_eq!(all[63].score, UNSCORABLE);
        assert_eq!(all[63].code, "code-63");
    }

    #[tokio::test]
    async fn test_top_three_ordered_descending() {
        let embedder = TableEmbedder::new();
        let index = CodeIndex::build(codes(), &embedder).await.unwrap();

        let results = index.suggest("nurse", 3, &embedder).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].code, "Registered Nurses");
        assert_eq!(results[1].code, "Nursing Assistants");
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score, "{:?}", results);
        }
    }

    #[tokio::test]
    async fn test_request_more_than_available_returns_all() {
        let embedder = TableEmbedder::new();
        let index = CodeIndex::build(codes(), &embedder).await.unwrap();

        let results = index.suggest("nurse", 20, &embedder).await.unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_codes_embedded_once() {
        let embedder = TableEmbedder::new();
        let index = CodeIndex::build(codes(), &embedder).await.unwrap();
        index.suggest("nurse", 2, &embedder).await.unwrap();
        index.suggest("nurse", 2, &embedder).await.unwrap();
        // one build call + one per query
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let embedder = TableEmbedder::new();
        let index = CodeIndex::build(codes(), &embedder).await.unwrap();
        let err = index.suggest("   ", 3, &embedder).await.unwrap_err();
        assert!(matches!(err, SuggestError::EmptyQuery));
    }

    #[tokio::test]
    async fn test_zero_suggestions_is_empty() {
        let embedder = TableEmbedder::new();
        let index = CodeIndex::build(codes(), &embedder).await.unwrap();
        assert!(index.suggest("nurse", 0, &embedder).await.unwrap().is_empty());
    }

    #[test]
    fn test_rank_ties_keep_code_order() {
        let index = CodeIndex::from_parts(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        );
        let ranked = index.rank(&[1.0, 0.0], 3);
        let order: Vec<&str> = ranked.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_from_parts_truncates_to_shorter() {
        let index = CodeIndex::from_parts(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![1.0]],
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index.codes(), &["A".to_string()]);
    }
}
