//! Offline embedding via feature hashing.
//!
//! Each lowercase alphanumeric token (longer than one character) is hashed
//! with FNV-1a into three buckets of a fixed-size vector, weighted by its
//! term frequency, and the result is L2-normalised. No model download, no
//! network: useful for demos and tests, not for serious semantic search.

use std::collections::HashMap;

use crate::error::LlmError;
use crate::provider::{EmbedProvider, l2_normalize};

pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Clone, Copy)]
pub struct LocalEmbedder {
    dimension: usize,
}

impl LocalEmbedder {
    /// A zero `dimension` is bumped to 1.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Synchronous embedding; the async trait method delegates here.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::EmptyInput`] for blank text.
    #[allow(clippy::cast_precision_loss)]
    pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if text.trim().is_empty() {
            return Err(LlmError::EmptyInput);
        }

        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1)
            .collect();
        if words.is_empty() {
            return Ok(vector);
        }

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for word in &words {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }

        let total = words.len() as f32;
        for (word, count) in &freq {
            let tf = count / total;
            let bytes = word.as_bytes();
            vector[bucket(fnv1a(bytes, None), self.dimension)] += tf;
            vector[bucket(fnv1a(bytes, Some(1)), self.dimension)] += tf * 0.7;
            vector[bucket(fnv1a(bytes, Some(2)), self.dimension)] += tf * 0.5;
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }
}

impl Default for LocalEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl EmbedProvider for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_sync(text)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "local"
    }
}

fn fnv1a(data: &[u8], salt: Option<u8>) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for &byte in data.iter().chain(salt.as_ref()) {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

fn bucket(hash: u32, dimension: usize) -> usize {
    usize::try_from(hash).unwrap_or(usize::MAX) % dimension
}
