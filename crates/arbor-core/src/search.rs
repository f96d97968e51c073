//! Two-stage search: BM25 candidates, then embedding rerank of those candidates.

use std::sync::Arc;

use arbor_llm::EmbedProvider;
use arbor_memory::{Bm25Index, Corpus, Reranker};
use serde::Serialize;

use crate::config::SearchConfig;
use crate::snippet::build_snippet;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Please provide a query.")]
    EmptyQuery,
}

/// One ranked document. `title` and `snippet` are raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_idx: usize,
    pub title: String,
    pub score: f32,
    pub snippet: String,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    pub lexical: Vec<SearchHit>,
    /// Reranked hits, or the reranker's error message. Lexical hits are
    /// returned either way.
    pub rerank: Result<Vec<SearchHit>, String>,
}

pub struct SearchEngine<P: EmbedProvider> {
    corpus: Corpus,
    bm25: Bm25Index,
    reranker: Reranker<P>,
    settings: SearchConfig,
}

impl<P: EmbedProvider> std::fmt::Debug for SearchEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("documents", &self.corpus.len())
            .field("provider", &self.reranker.provider().name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<P: EmbedProvider> SearchEngine<P> {
    #[must_use]
    pub fn new(corpus: Corpus, provider: Arc<P>, settings: SearchConfig) -> Self {
        let bm25 = Bm25Index::new(corpus.contents());
        tracing::info!(documents = corpus.len(), "search engine ready");
        Self {
            corpus,
            bm25,
            reranker: Reranker::new(provider),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SearchConfig {
        &self.settings
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Clamp a requested depth to `1..=max_top_k`.
    #[must_use]
    pub fn clamp_top_k(&self, top_k: usize) -> usize {
        top_k.clamp(1, self.settings.max_top_k.max(1))
    }

    /// Run both stages for `query`.
    ///
    /// `top_k` bounds the lexical candidates, `rerank_top_k` the reranked
    /// list. A reranker failure is reported inside the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyQuery`] for a blank query.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        rerank_top_k: usize,
    ) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let top_k = self.clamp_top_k(top_k);
        let rerank_top_k = self.clamp_top_k(rerank_top_k);

        let candidates = self.bm25.search(query, top_k);
        let lexical = candidates
            .iter()
            .enumerate()
            .map(|(i, &(doc_idx, score))| self.hit(i + 1, doc_idx, score, query))
            .collect();

        let contents: Vec<&str> = candidates
            .iter()
            .map(|&(doc_idx, _)| self.corpus.content(doc_idx).unwrap_or_default())
            .collect();
        let rerank = match self.reranker.rerank(query, &contents, rerank_top_k).await {
            Ok(ranked) => Ok(ranked
                .into_iter()
                .enumerate()
                .map(|(i, (pos, score))| self.hit(i + 1, candidates[pos].0, score, query))
                .collect()),
            Err(e) => {
                tracing::warn!("rerank failed, returning lexical results only: {e:#}");
                Err(e.to_string())
            }
        };

        tracing::debug!(query, top_k, rerank_top_k, "search completed");
        Ok(SearchOutcome {
            query: query.to_owned(),
            lexical,
            rerank,
        })
    }

    fn hit(&self, rank: usize, doc_idx: usize, score: f32, query: &str) -> SearchHit {
        let content = self.corpus.content(doc_idx).unwrap_or_default();
        SearchHit {
            rank,
            doc_idx,
            title: self.corpus.title(doc_idx).into_owned(),
            score,
            snippet: build_snippet(content, query, self.settings.snippet_length),
        }
    }
}

#[cfg(test)]
mod tests {
    use arbor_llm::local::LocalEmbedder;
    use arbor_llm::mock::MockProvider;
    use arbor_memory::CorpusDocument;

    use super::*;

    fn corpus() -> Corpus {
        Corpus::new(vec![
            CorpusDocument {
                title: Some("Relativity".into()),
                content: "Albert Einstein developed the theory of relativity".into(),
            },
            CorpusDocument {
                title: Some("Gravity".into()),
                content: "Isaac Newton described gravity and motion".into(),
            },
            CorpusDocument {
                title: None,
                content: "Marie Curie studied radioactivity".into(),
            },
        ])
        .unwrap()
    }

    fn engine<P: EmbedProvider>(provider: P) -> SearchEngine<P> {
        SearchEngine::new(corpus(), Arc::new(provider), SearchConfig::default())
    }

    #[tokio::test]
    async fn blank_query_rejected() {
        let engine = engine(LocalEmbedder::default());
        assert!(matches!(
            engine.search("   ", 5, 5).await,
            Err(SearchError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn lexical_and_rerank_hits() {
        let engine = engine(LocalEmbedder::default());
        let outcome = engine.search("  einstein relativity ", 5, 5).await.unwrap();
        assert_eq!(outcome.query, "einstein relativity");

        assert_eq!(outcome.lexical.len(), 3);
        let top = &outcome.lexical[0];
        assert_eq!((top.rank, top.doc_idx), (1, 0));
        assert_eq!(top.title, "Relativity");
        assert!(top.snippet.contains("Einstein"));
        let ranks: Vec<usize> = outcome.lexical.iter().map(|h| h.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);

        let reranked = outcome.rerank.unwrap();
        assert_eq!(reranked.len(), 3);
        assert_eq!(reranked[0].doc_idx, 0);
    }

    #[tokio::test]
    async fn rerank_depth_and_index_mapping() {
        let provider = MockProvider::with_vectors([
            ("curie", vec![1.0, 0.0]),
            ("Marie Curie studied radioactivity", vec![1.0, 0.0]),
        ])
        .with_default(vec![0.0, 1.0]);
        let engine = engine(provider);

        let outcome = engine.search("curie", 3, 1).await.unwrap();
        let reranked = outcome.rerank.unwrap();
        assert_eq!(reranked.len(), 1);
        assert_eq!(reranked[0].doc_idx, 2);
        assert_eq!(reranked[0].title, "Doc 2");
        assert!((reranked[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn rerank_failure_keeps_lexical_hits() {
        let engine = engine(MockProvider::failing());
        let outcome = engine.search("gravity", 2, 2).await.unwrap();
        assert_eq!(outcome.lexical.len(), 2);
        assert_eq!(outcome.lexical[0].doc_idx, 1);
        assert!(outcome.rerank.unwrap_err().contains("mock"));
    }

    #[tokio::test]
    async fn blank_document_does_not_break_rerank() {
        let corpus = Corpus::new(vec![
            CorpusDocument {
                title: None,
                content: "Einstein relativity".into(),
            },
            CorpusDocument {
                title: None,
                content: String::new(),
            },
        ])
        .unwrap();
        let engine = SearchEngine::new(
            corpus,
            Arc::new(LocalEmbedder::default()),
            SearchConfig::default(),
        );

        let outcome = engine.search("einstein", 5, 5).await.unwrap();
        let lexical: Vec<usize> = outcome.lexical.iter().map(|h| h.doc_idx).collect();
        assert_eq!(lexical, [0, 1]);

        let reranked = outcome.rerank.unwrap();
        let order: Vec<usize> = reranked.iter().map(|h| h.doc_idx).collect();
        assert_eq!(order, [0, 1]);
        assert!(reranked[1].score.abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn top_k_is_clamped() {
        let engine = engine(LocalEmbedder::default());
        let outcome = engine.search("newton", 0, 0).await.unwrap();
        assert_eq!(outcome.lexical.len(), 1);
        assert_eq!(outcome.rerank.unwrap().len(), 1);

        assert_eq!(engine.clamp_top_k(1000), 50);
        assert_eq!(engine.clamp_top_k(7), 7);
    }

    #[tokio::test]
    async fn snippet_length_follows_settings() {
        let settings = SearchConfig {
            snippet_length: 6,
            ..SearchConfig::default()
        };
        let engine = SearchEngine::new(corpus(), Arc::new(LocalEmbedder::default()), settings);
        let outcome = engine.search("zzz", 1, 1).await.unwrap();
        assert_eq!(outcome.lexical[0].snippet, "Albert");
    }
}
