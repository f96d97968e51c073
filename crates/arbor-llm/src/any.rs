#[cfg(feature = "candle")]
use crate::candle_provider::CandleEmbedder;
use crate::error::LlmError;
use crate::local::LocalEmbedder;
#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::provider::EmbedProvider;

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            AnyProvider::Local($p) => $expr,
            #[cfg(feature = "candle")]
            AnyProvider::Candle($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

/// Runtime-selected embedding backend.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    Local(LocalEmbedder),
    #[cfg(feature = "candle")]
    Candle(CandleEmbedder),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl EmbedProvider for AnyProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
        delegate_provider!(self, |p| p.embed_batch(texts).await)
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_variant_delegates() {
        let provider = AnyProvider::Local(LocalEmbedder::new(32));
        assert_eq!(provider.name(), "local");
        let v = provider.embed("tree based chunking").await.unwrap();
        assert_eq!(v.len(), 32);
    }

    #[tokio::test]
    async fn batch_delegates_in_order() {
        let provider = AnyProvider::Local(LocalEmbedder::new(32));
        let batch = provider
            .embed_batch(&["first text", "second text"])
            .await
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], provider.embed("first text").await.unwrap());
    }

    #[test]
    fn ollama_variant_name() {
        let provider = AnyProvider::Ollama(OllamaProvider::new(
            "http://localhost:11434",
            "all-minilm".into(),
        ));
        assert_eq!(provider.name(), "ollama");
    }
}
