//! Configuration, provider bootstrap, and the two-stage search engine.

pub mod bootstrap;
pub mod config;
pub mod search;
pub mod snippet;

pub use search::{SearchEngine, SearchError, SearchHit, SearchOutcome};
