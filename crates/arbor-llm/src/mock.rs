//! Test-only mock embedding provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::LlmError;
use crate::provider::EmbedProvider;

#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Returned for any text without an entry in `vectors`.
    pub default_embedding: Vec<f32>,
    pub vectors: HashMap<String, Vec<f32>>,
    /// Fail every call.
    pub fail: bool,
    /// Fail only when embedding this exact text.
    pub fail_on: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            default_embedding: vec![0.0; 4],
            vectors: HashMap::new(),
            fail: false,
            fail_on: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_vectors<I, S>(vectors: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        Self {
            vectors: vectors.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_default(mut self, embedding: Vec<f32>) -> Self {
        self.default_embedding = embedding;
        self
    }

    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.fail_on = Some(text.into());
        self
    }

    /// Number of `embed` calls made so far, across clones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbedProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail || self.fail_on.as_deref() == Some(text) {
            return Err(LlmError::Other("mock embed error".into()));
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default_embedding.clone()))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
