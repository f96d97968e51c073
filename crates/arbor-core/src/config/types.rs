use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Embedding backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    Candle,
    Local,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Candle => "candle",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_embedding_model() -> String {
    "all-minilm".into()
}

fn default_dimension() -> usize {
    384
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Vector size of the local hashing provider.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candle: Option<CandleConfig>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_base_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            candle: None,
        }
    }
}

fn default_candle_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".into()
}

fn default_candle_device() -> String {
    "cpu".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CandleConfig {
    #[serde(default = "default_candle_repo")]
    pub repo_id: String,
    #[serde(default = "default_candle_device")]
    pub device: String,
}

impl Default for CandleConfig {
    fn default() -> Self {
        Self {
            repo_id: default_candle_repo(),
            device: default_candle_device(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/corpus.jsonl")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

fn default_retrieve_top_k() -> usize {
    5
}

fn default_rerank_top_k() -> usize {
    5
}

fn default_form_rerank_top_k() -> usize {
    1
}

fn default_snippet_length() -> usize {
    300
}

fn default_max_top_k() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Candidates kept from the lexical stage.
    #[serde(default = "default_retrieve_top_k")]
    pub retrieve_top_k: usize,
    #[serde(default = "default_rerank_top_k")]
    pub rerank_top_k: usize,
    /// Rerank depth used by the HTML form view.
    #[serde(default = "default_form_rerank_top_k")]
    pub form_rerank_top_k: usize,
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,
    /// Upper bound applied to client supplied `topk`.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            retrieve_top_k: default_retrieve_top_k(),
            rerank_top_k: default_rerank_top_k(),
            form_rerank_top_k: default_form_rerank_top_k(),
            snippet_length: default_snippet_length(),
            max_top_k: default_max_top_k(),
        }
    }
}

fn default_max_file_size() -> u64 {
    arbor_memory::document::DEFAULT_MAX_FILE_SIZE
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Root node title for every chunked document. Unset: the file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_title: Option<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            root_title: None,
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_gateway_bind() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    7860
}

fn default_gateway_max_body() -> usize {
    65_536
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    #[serde(default = "default_gateway_max_body")]
    pub max_body_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            max_body_size: default_gateway_max_body(),
        }
    }
}
