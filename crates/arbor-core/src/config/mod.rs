mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values that would make search or embedding meaningless.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.embedding.model.trim().is_empty() {
            bail!("embedding.model must not be empty");
        }
        if self.embedding.dimension == 0 {
            bail!("embedding.dimension must be greater than 0");
        }
        let search = &self.search;
        for (name, value) in [
            ("search.retrieve_top_k", search.retrieve_top_k),
            ("search.rerank_top_k", search.rerank_top_k),
            ("search.form_rerank_top_k", search.form_rerank_top_k),
            ("search.max_top_k", search.max_top_k),
            ("search.snippet_length", search.snippet_length),
        ] {
            if value == 0 {
                bail!("{name} must be greater than 0");
            }
        }
        if self.gateway.max_body_size == 0 {
            bail!("gateway.max_body_size must be greater than 0");
        }
        Ok(())
    }
}

/// `--config <path>`, then `ARBOR_CONFIG`, then `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("ARBOR_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
