//! Document extraction, hierarchical chunk trees, node index, and two-stage
//! (BM25 then embedding) retrieval.

pub mod bm25;
pub mod corpus;
pub mod document;
pub mod rerank;
pub mod tree;

pub use bm25::{Bm25Index, Bm25Params};
pub use corpus::{Corpus, CorpusDocument, CorpusError};
pub use document::{Document, DocumentError, DocumentLoader, loader_for_path};
pub use rerank::Reranker;
pub use tree::{IndexError, Node, NodeHit, NodeIndex, NodeTree, TreeBuilder, TreeError};
