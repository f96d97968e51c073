use std::collections::HashMap;
use std::sync::Arc;

use arbor_llm::EmbedProvider;
use arbor_llm::provider::l2_normalize;
use serde::Serialize;

use super::{IndexError, Node, NodeTree};

/// A ranked query result.
#[derive(Debug, Clone, Serialize)]
pub struct NodeHit<'a> {
    pub score: f32,
    pub node: &'a Node,
}

/// Exact inner-product index over every node of one tree.
///
/// Vectors live in a single flat buffer; slot `i` covers
/// `vectors[i * dimension..(i + 1) * dimension]` and maps to `slot_ids[i]`.
/// The provider used for building is the one used for querying.
pub struct NodeIndex<P: EmbedProvider> {
    provider: Arc<P>,
    vectors: Vec<f32>,
    dimension: usize,
    slot_ids: Vec<String>,
    nodes: HashMap<String, Node>,
    built: bool,
}

impl<P: EmbedProvider> std::fmt::Debug for NodeIndex<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeIndex")
            .field("provider", &self.provider.name())
            .field("dimension", &self.dimension)
            .field("len", &self.slot_ids.len())
            .field("built", &self.built)
            .finish_non_exhaustive()
    }
}

impl<P: EmbedProvider> NodeIndex<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            vectors: Vec::new(),
            dimension: 0,
            slot_ids: Vec::new(),
            nodes: HashMap::new(),
            built: false,
        }
    }

    /// Embed every node of `tree` and commit them in creation order.
    ///
    /// Nothing is committed unless every node embeds successfully.
    ///
    /// # Errors
    ///
    /// [`IndexError::AlreadyBuilt`] if the index holds a tree already,
    /// [`IndexError::Embedding`], [`IndexError::EmptyEmbedding`] or
    /// [`IndexError::DimensionMismatch`] if a node cannot be embedded.
    pub async fn build(&mut self, tree: &NodeTree) -> Result<(), IndexError> {
        if self.built {
            return Err(IndexError::AlreadyBuilt);
        }

        let mut vectors = Vec::new();
        let mut dimension = 0;
        let mut slot_ids = Vec::with_capacity(tree.len());
        let mut nodes = HashMap::with_capacity(tree.len());

        for node in tree.iter() {
            let mut vector = self
                .provider
                .embed(&node.searchable_text())
                .await
                .map_err(|source| IndexError::Embedding {
                    node_id: node.id().to_owned(),
                    source,
                })?;

            if vector.is_empty() {
                return Err(IndexError::EmptyEmbedding(node.id().to_owned()));
            }
            if dimension == 0 {
                dimension = vector.len();
                vectors.reserve(dimension * tree.len());
            } else if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }

            l2_normalize(&mut vector);
            vectors.extend_from_slice(&vector);
            slot_ids.push(node.id().to_owned());
            nodes.insert(node.id().to_owned(), node.clone());
        }

        self.vectors = vectors;
        self.dimension = dimension;
        self.slot_ids = slot_ids;
        self.nodes = nodes;
        self.built = true;

        tracing::info!(
            nodes = self.slot_ids.len(),
            dimension,
            provider = self.provider.name(),
            "node index built"
        );
        Ok(())
    }

    /// Top `top_k` nodes by inner product with the normalised query vector,
    /// highest first. Equal scores keep slot order.
    ///
    /// # Errors
    ///
    /// [`IndexError::NotBuilt`] before [`NodeIndex::build`],
    /// [`IndexError::QueryEmbedding`] or [`IndexError::DimensionMismatch`] if the
    /// query cannot be embedded.
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<NodeHit<'_>>, IndexError> {
        if !self.built {
            return Err(IndexError::NotBuilt);
        }
        if top_k == 0 || self.slot_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = self
            .provider
            .embed(text)
            .await
            .map_err(IndexError::QueryEmbedding)?;
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .map(|v| v.iter().zip(&query).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        tracing::debug!(top_k, returned = scored.len(), "node index query");

        Ok(scored
            .into_iter()
            .filter_map(|(slot, score)| {
                self.nodes
                    .get(&self.slot_ids[slot])
                    .map(|node| NodeHit { score, node })
            })
            .collect())
    }

    /// Drop all vectors and metadata so the index can be built again.
    pub fn reset(&mut self) {
        self.vectors.clear();
        self.dimension = 0;
        self.slot_ids.clear();
        self.nodes.clear();
        self.built = false;
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slot_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slot_ids.is_empty()
    }

    /// Vector dimension, `None` until built.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.built.then_some(self.dimension)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Node id stored at `slot`.
    #[must_use]
    pub fn slot_id(&self, slot: usize) -> Option<&str> {
        self.slot_ids.get(slot).map(String::as_str)
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }
}
