//! Application bootstrap: provider construction, corpus loading, engine wiring.

use std::sync::Arc;

use anyhow::Context;
use arbor_llm::any::AnyProvider;
use arbor_llm::local::LocalEmbedder;
use arbor_llm::ollama::OllamaProvider;
use arbor_memory::Corpus;
use tokio::sync::watch;

use crate::config::{Config, ProviderKind};
use crate::search::SearchEngine;

/// Build the embedding provider selected by `config.embedding.provider`.
///
/// # Errors
///
/// Returns an error if the candle model cannot be loaded, or if candle is
/// selected in a build without the `candle` feature.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let embedding = &config.embedding;
    match embedding.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &embedding.base_url,
            embedding.model.clone(),
        ))),
        ProviderKind::Local => Ok(AnyProvider::Local(LocalEmbedder::new(embedding.dimension))),
        #[cfg(feature = "candle")]
        ProviderKind::Candle => {
            let candle = embedding.candle.clone().unwrap_or_default();
            let device = arbor_llm::candle_provider::device_from_name(&candle.device)?;
            let provider = arbor_llm::candle_provider::CandleEmbedder::load(&candle.repo_id, device)
                .with_context(|| format!("failed to load embedding model {}", candle.repo_id))?;
            Ok(AnyProvider::Candle(provider))
        }
        #[cfg(not(feature = "candle"))]
        ProviderKind::Candle => {
            anyhow::bail!("embedding provider candle not available (feature not enabled)")
        }
    }
}

/// Log provider readiness. Failures are not fatal: queries report them later.
pub async fn health_check(provider: &AnyProvider) {
    match provider {
        AnyProvider::Ollama(ollama) => match ollama.health_check().await {
            Ok(()) => tracing::info!(
                model = ollama.embedding_model(),
                "ollama health check passed"
            ),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        },
        #[cfg(feature = "candle")]
        AnyProvider::Candle(candle) => {
            tracing::info!("candle embedder loaded, device: {}", candle.device_name());
        }
        AnyProvider::Local(local) => {
            tracing::info!(dimension = local.dimension(), "using local hashing embedder");
        }
        #[allow(unreachable_patterns)]
        _ => {}
    }
}

/// Load the configured corpus and wire it to `provider`.
///
/// # Errors
///
/// Returns an error if the corpus cannot be loaded.
pub async fn build_engine(
    config: &Config,
    provider: Arc<AnyProvider>,
) -> anyhow::Result<SearchEngine<AnyProvider>> {
    let corpus = Corpus::load(&config.corpus.path)
        .await
        .with_context(|| format!("failed to load corpus {}", config.corpus.path.display()))?;
    Ok(SearchEngine::new(corpus, provider, config.search.clone()))
}

#[must_use]
pub fn build_shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

#[cfg(test)]
mod tests {
    use arbor_llm::EmbedProvider;

    use super::*;

    #[test]
    fn local_provider_uses_configured_dimension() {
        let mut config = Config::default();
        config.embedding.provider = ProviderKind::Local;
        config.embedding.dimension = 64;
        let provider = create_provider(&config).unwrap();
        assert!(matches!(&provider, AnyProvider::Local(p) if p.dimension() == 64));
        assert_eq!(provider.name(), "local");
    }

    #[test]
    fn ollama_provider_by_default() {
        let provider = create_provider(&Config::default()).unwrap();
        match provider {
            AnyProvider::Ollama(p) => assert_eq!(p.embedding_model(), "all-minilm"),
            other => panic!("expected ollama, got {}", other.name()),
        }
    }

    #[cfg(not(feature = "candle"))]
    #[test]
    fn candle_without_feature_is_error() {
        let mut config = Config::default();
        config.embedding.provider = ProviderKind::Candle;
        let err = create_provider(&config).unwrap_err();
        assert!(err.to_string().contains("candle"));
    }

    #[tokio::test]
    async fn engine_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        std::fs::write(
            &path,
            "{\"title\": \"One\", \"content\": \"first document\"}\n{\"content\": \"second document\"}\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.corpus.path = path;
        let provider = Arc::new(AnyProvider::Local(LocalEmbedder::new(32)));
        let engine = build_engine(&config, provider).await.unwrap();
        assert_eq!(engine.corpus().len(), 2);

        let outcome = engine.search("second", 5, 5).await.unwrap();
        assert_eq!(outcome.lexical[0].doc_idx, 1);
        assert_eq!(outcome.lexical[0].title, "Doc 1");
    }

    #[tokio::test]
    async fn missing_corpus_has_context() {
        let mut config = Config::default();
        config.corpus.path = "/nonexistent/corpus.jsonl".into();
        let provider = Arc::new(AnyProvider::Local(LocalEmbedder::default()));
        let err = build_engine(&config, provider).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to load corpus"));
    }
}
