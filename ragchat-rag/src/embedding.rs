//! The seam between ragchat and whatever turns text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into fixed-length vectors.
///
/// Every vector a provider returns has [`dimensions`](Self::dimensions)
/// components. [`model_name`](Self::model_name) is recorded with each
/// collection, so an index built with one model is never queried with
/// another.
///
/// ```rust,ignore
/// let provider = OpenAIEmbeddingProvider::from_env()?;
/// let vectors = provider.embed_batch(&["first", "second"]).await?;
/// assert_eq!(vectors[0].len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, keeping their order.
    ///
    /// Falls back to one [`embed`](Self::embed) call per text.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize;

    fn model_name(&self) -> &str;
}
