use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ARBOR_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid ARBOR_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("ARBOR_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("ARBOR_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("ARBOR_EMBEDDING_DIMENSION") {
            match v.parse::<usize>() {
                Ok(dim) => self.embedding.dimension = dim,
                Err(_) => tracing::warn!("ignoring invalid ARBOR_EMBEDDING_DIMENSION value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("ARBOR_CORPUS_PATH") {
            self.corpus.path = v.into();
        }
        if let Ok(v) = std::env::var("ARBOR_SEARCH_RETRIEVE_TOP_K") {
            match v.parse::<usize>() {
                Ok(k) => self.search.retrieve_top_k = k,
                Err(_) => tracing::warn!("ignoring invalid ARBOR_SEARCH_RETRIEVE_TOP_K value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("ARBOR_SEARCH_RERANK_TOP_K") {
            match v.parse::<usize>() {
                Ok(k) => self.search.rerank_top_k = k,
                Err(_) => tracing::warn!("ignoring invalid ARBOR_SEARCH_RERANK_TOP_K value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("ARBOR_SEARCH_SNIPPET_LENGTH") {
            match v.parse::<usize>() {
                Ok(len) => self.search.snippet_length = len,
                Err(_) => tracing::warn!("ignoring invalid ARBOR_SEARCH_SNIPPET_LENGTH value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("ARBOR_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("ARBOR_GATEWAY_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!("ignoring invalid ARBOR_GATEWAY_PORT value: {v}"),
            }
        }
    }
}
