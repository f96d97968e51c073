//! Local sentence embeddings computed with candle.

pub mod embed;

use std::sync::Arc;

pub use candle_core::Device;

use self::embed::EmbedModel;
use crate::error::LlmError;
use crate::provider::EmbedProvider;

/// Default sentence-transformers checkpoint (384-dimensional output).
pub const DEFAULT_EMBED_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

#[derive(Clone, Debug)]
pub struct CandleEmbedder {
    model: Arc<EmbedModel>,
    device: Device,
}

impl CandleEmbedder {
    /// Download (or reuse the cached copy of) `repo_id` and load it on `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be fetched or loaded.
    pub fn load(repo_id: &str, device: Device) -> Result<Self, LlmError> {
        tracing::info!(repo_id, "loading candle embedding model");
        let model = EmbedModel::load(repo_id, &device)?;
        Ok(Self {
            model: Arc::new(model),
            device,
        })
    }

    #[must_use]
    pub fn device_name(&self) -> &'static str {
        match &self.device {
            Device::Cpu => "cpu",
            Device::Cuda(_) => "cuda",
            Device::Metal(_) => "metal",
        }
    }
}

/// Resolve a device name from configuration. Unknown names fall back to CPU.
///
/// # Errors
///
/// Returns an error if the requested accelerator cannot be initialised.
pub fn device_from_name(name: &str) -> Result<Device, LlmError> {
    match name {
        "cuda" => Device::new_cuda(0).map_err(LlmError::Candle),
        "metal" => Device::new_metal(0).map_err(LlmError::Candle),
        "cpu" => Ok(Device::Cpu),
        other => {
            tracing::warn!("unknown candle device '{other}', using cpu");
            Ok(Device::Cpu)
        }
    }
}

impl EmbedProvider for CandleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if text.trim().is_empty() {
            return Err(LlmError::EmptyInput);
        }
        let model = Arc::clone(&self.model);
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || model.embed_sync(&text))
            .await
            .map_err(|e| LlmError::Inference(format!("candle embedding task failed: {e}")))?
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "candle"
    }
}
