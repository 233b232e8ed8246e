use std::pin::Pin;
use std::sync::Arc;

use ravel_model::{EmbeddingProvider, ProviderError};

use crate::error::Error;

type EmbedResult = Result<Vec<Vec<f32>>, Box<dyn ProviderError>>;
type BoxedEmbedFuture = Pin<Box<dyn Future<Output = EmbedResult> + Send>>;
type EmbedFn = Arc<dyn Fn(Vec<String>) -> BoxedEmbedFuture + Send + Sync>;

struct Entry {
    embedding: Vec<f32>,
    text: String,
}

/// A retrieved chunk with its similarity to the query.
#[derive(Clone, Debug)]
pub struct Scored {
    /// The stored text.
    pub text: String,
    /// Cosine similarity in `[-1, 1]`, higher is closer.
    pub score: f32,
}

/// An in-memory vector index over text chunks.
///
/// Texts are embedded on insertion; queries are embedded on search and
/// matched against the stored vectors by cosine similarity. The index
/// erases the embedding provider's concrete type at construction time,
/// the same way the chat loops erase theirs.
pub struct VectorIndex {
    embed_fn: EmbedFn,
    entries: Vec<Entry>,
}

impl VectorIndex {
    /// Creates an empty index backed by an embedding provider.
    pub fn new<P: EmbeddingProvider + 'static>(provider: P) -> Self {
        let embed_fn: EmbedFn = Arc::new(move |texts| {
            let fut = provider.embed(&texts);
            Box::pin(async move {
                fut.await
                    .map_err(|err| Box::new(err) as Box<dyn ProviderError>)
            })
        });
        Self {
            embed_fn,
            entries: Vec::new(),
        }
    }

    /// Returns the number of indexed chunks.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embeds and stores a batch of texts.
    pub async fn add_texts(&mut self, texts: Vec<String>) -> Result<(), Error> {
        if texts.is_empty() {
            return Ok(());
        }
        debug!("embedding {} texts", texts.len());
        let embeddings = (self.embed_fn)(texts.clone()).await?;
        for (text, embedding) in texts.into_iter().zip(embeddings) {
            self.entries.push(Entry { embedding, text });
        }
        Ok(())
    }

    /// Returns the `k` stored texts closest to the query, best first.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Scored>, Error> {
        let mut embeddings = (self.embed_fn)(vec![query.to_owned()]).await?;
        let Some(query_embedding) = embeddings.pop() else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<Scored> = self
            .entries
            .iter()
            .map(|entry| Scored {
                text: entry.text.clone(),
                score: cosine(&query_embedding, &entry.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
