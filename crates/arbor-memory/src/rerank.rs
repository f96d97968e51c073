use std::sync::Arc;

use arbor_llm::provider::cosine_similarity;
use arbor_llm::{EmbedProvider, LlmError};

/// Second-stage ranking of lexical candidates by embedding similarity.
#[derive(Debug)]
pub struct Reranker<P> {
    provider: Arc<P>,
}

impl<P> Clone for Reranker<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: EmbedProvider> Reranker<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Score `documents` against `query` by cosine similarity and return the
    /// `top_k` best as `(position_in_documents, score)`, highest first.
    /// Blank documents are not embedded and score 0.0.
    ///
    /// # Errors
    ///
    /// Returns the provider error if the query or any document fails to embed.
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[&str],
        top_k: usize,
    ) -> Result<Vec<(usize, f32)>, LlmError> {
        if documents.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let (positions, texts): (Vec<usize>, Vec<&str>) = documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| !doc.trim().is_empty())
            .map(|(i, doc)| (i, *doc))
            .unzip();

        let mut scores = vec![0.0f32; documents.len()];
        if !texts.is_empty() {
            let query_vec = self.provider.embed(query).await?;
            let doc_vecs = self.provider.embed_batch(&texts).await?;
            if doc_vecs.len() != texts.len() {
                return Err(LlmError::Other(format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    doc_vecs.len()
                )));
            }
            for (&pos, vector) in positions.iter().zip(&doc_vecs) {
                scores[pos] = cosine_similarity(&query_vec, vector);
            }
        }

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);

        tracing::debug!(
            provider = self.provider.name(),
            candidates = documents.len(),
            kept = ranked.len(),
            "reranked"
        );
        Ok(ranked)
    }
}
