//! Local Embedding Provider
//!
//! fastembed-backed [`EmbeddingProvider`] running ONNX inference in-process.
//! The model loads lazily, exactly once per process; a failed load is cached
//! and surfaced as [`EmbeddingError::ModelUnavailable`] on every subsequent
//! call rather than silently retried.

use std::sync::{Mutex, MutexGuard, OnceLock};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{l2_normalize, EmbeddingError, EmbeddingProvider};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Embedding dimensions after Matryoshka truncation (768 → 256).
/// The first N dims of a Matryoshka model are a valid N-dim representation.
pub const EMBEDDING_DIMENSIONS: usize = 256;

/// Maximum text length fed to the model (longer input is truncated)
pub const MAX_TEXT_LENGTH: usize = 8192;

/// Batch size for embedding generation
pub const BATCH_SIZE: usize = 32;

// ============================================================================
// GLOBAL MODEL
// ============================================================================

static EMBEDDING_MODEL_RESULT: OnceLock<Result<Mutex<TextEmbedding>, String>> = OnceLock::new();

/// Cache directory for fastembed model files.
/// `SCOUT_FASTEMBED_CACHE` env var wins, then the platform cache directory.
fn cache_dir() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("SCOUT_FASTEMBED_CACHE") {
        return std::path::PathBuf::from(path);
    }

    if let Some(proj_dirs) = directories::ProjectDirs::from("io", "scout", "core") {
        return proj_dirs.cache_dir().join("fastembed");
    }

    if let Some(base_dirs) = directories::BaseDirs::new() {
        return base_dirs.home_dir().join(".cache/scout/fastembed");
    }

    std::path::PathBuf::from(".fastembed_cache")
}

/// Load-once access to the global model.
fn model() -> Result<MutexGuard<'static, TextEmbedding>, EmbeddingError> {
    let result = EMBEDDING_MODEL_RESULT.get_or_init(|| {
        let cache = cache_dir();
        if let Err(e) = std::fs::create_dir_all(&cache) {
            tracing::warn!("Failed to create model cache directory {:?}: {}", cache, e);
        }

        let options = InitOptions::new(EmbeddingModel::NomicEmbedTextV15)
            .with_show_download_progress(false)
            .with_cache_dir(cache);

        TextEmbedding::try_new(options).map(Mutex::new).map_err(|e| {
            format!(
                "Failed to initialize nomic-embed-text-v1.5: {}. \
                Ensure ONNX runtime is available and model files can be downloaded.",
                e
            )
        })
    });

    match result {
        Ok(model) => model
            .lock()
            .map_err(|e| EmbeddingError::ModelUnavailable(format!("Lock poisoned: {}", e))),
        Err(err) => Err(EmbeddingError::ModelUnavailable(err.clone())),
    }
}

/// Truncate on a char boundary so multibyte input never panics.
fn truncate_input(text: &str) -> &str {
    if text.len() <= MAX_TEXT_LENGTH {
        return text;
    }
    let mut end = MAX_TEXT_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Truncate to [`EMBEDDING_DIMENSIONS`] and L2-normalize.
fn finalize(mut vector: Vec<f32>) -> Vec<f32> {
    if vector.len() > EMBEDDING_DIMENSIONS {
        vector.truncate(EMBEDDING_DIMENSIONS);
    }
    l2_normalize(&mut vector);
    vector
}

// ============================================================================
// LOCAL EMBEDDER
// ============================================================================

/// fastembed-backed embedding provider.
///
/// All instances share one lazily-loaded model; constructing an embedder is
/// free and does not touch the model.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEmbedder;

impl LocalEmbedder {
    /// Create a new embedder. The model is not loaded until first use.
    pub fn new() -> Self {
        Self
    }

    /// Force model initialization now (downloads on first run).
    pub fn init(&self) -> Result<(), EmbeddingError> {
        model().map(|_| ())
    }

    /// The model identifier backing this provider.
    pub fn model_name(&self) -> &'static str {
        "nomic-ai/nomic-embed-text-v1.5"
    }
}

impl EmbeddingProvider for LocalEmbedder {
    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Text cannot be empty".to_string(),
            ));
        }

        let mut model = model()?;
        let embeddings = model
            .embed(vec![truncate_input(text)], None)
            .map_err(|e| EmbeddingError::Failed(e.to_string()))?;

        match embeddings.into_iter().next() {
            Some(v) => Ok(finalize(v)),
            None => Err(EmbeddingError::Failed("No embedding generated".to_string())),
        }
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = model()?;
        let mut all = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let truncated: Vec<&str> = chunk.iter().map(|t| truncate_input(t)).collect();
            let embeddings = model
                .embed(truncated, None)
                .map_err(|e| EmbeddingError::Failed(e.to_string()))?;
            all.extend(embeddings.into_iter().map(finalize));
        }

        Ok(all)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_input_char_boundary() {
        let text = "é".repeat(MAX_TEXT_LENGTH); // 2 bytes per char
        let truncated = truncate_input(&text);
        assert!(truncated.len() <= MAX_TEXT_LENGTH);
        assert!(truncated.is_char_boundary(truncated.len()));
    }

    #[test]
    fn test_finalize_truncates_and_normalizes() {
        let v = vec![1.0_f32; EMBEDDING_DIMENSIONS * 3];
        let out = finalize(v);
        assert_eq!(out.len(), EMBEDDING_DIMENSIONS);
        let norm: f32 = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_embed_rejects_empty_text() {
        let embedder = LocalEmbedder::new();
        assert!(matches!(
            embedder.embed(""),
            Err(EmbeddingError::InvalidInput(_))
        ));
    }
}
