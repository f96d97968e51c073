use arbor_llm::LlmError;

/// Structural invariant violations found while loading or validating a tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("tree has no root node")]
    MissingRoot,

    #[error("tree has more than one root: {first} and {second}")]
    MultipleRoots { first: String, second: String },

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("node {id} references unknown parent {parent}")]
    UnknownParent { id: String, parent: String },

    #[error("node {id} lists unknown child {child}")]
    UnknownChild { id: String, child: String },

    #[error("node {id} lists child {child} more than once")]
    DuplicateChild { id: String, child: String },

    #[error("node {id} lists child {child} whose parent is different")]
    ParentMismatch { id: String, child: String },

    #[error("node {id} is not listed among the children of its parent {parent}")]
    NotListed { id: String, parent: String },

    #[error("node {id} has level {actual}, expected {expected}")]
    LevelMismatch { id: String, expected: u8, actual: u8 },

    #[error("node {0} is not reachable from the root")]
    Unreachable(String),

    #[error("node {0} has neither title nor text")]
    BlankNode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the node index lifecycle and its embedding calls.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("index has not been built")]
    NotBuilt,

    #[error("index is already built; call reset() before rebuilding")]
    AlreadyBuilt,

    #[error("failed to embed node {node_id}: {source}")]
    Embedding {
        node_id: String,
        #[source]
        source: LlmError,
    },

    #[error("failed to embed query: {0}")]
    QueryEmbedding(#[source] LlmError),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("provider returned an empty embedding for node {0}")]
    EmptyEmbedding(String),
}
