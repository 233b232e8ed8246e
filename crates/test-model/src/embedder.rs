use std::future::ready;
use std::hash::{DefaultHasher, Hash, Hasher};

use ravel_model::EmbeddingProvider;

use crate::Error;

const DIMENSIONS: usize = 32;

/// A deterministic embedder for tests.
///
/// Each text becomes a normalized bag-of-words vector with words hashed
/// into a fixed number of buckets, so texts sharing vocabulary score a
/// higher cosine similarity than unrelated ones. Not a real embedding,
/// but stable across runs and good enough to exercise retrieval.
#[derive(Clone, Copy, Debug, Default)]
pub struct FakeEmbedder;

impl FakeEmbedder {
    fn embed_one(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            vector[(hasher.finish() % DIMENSIONS as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl EmbeddingProvider for FakeEmbedder {
    type Error = Error;

    fn embed(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, Self::Error>> + Send + 'static
    {
        let vectors = texts.iter().map(|t| Self::embed_one(t)).collect();
        ready(Ok(vectors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_similar_texts_score_higher() {
        let texts = vec![
            "the quick brown fox".to_owned(),
            "the quick brown dog".to_owned(),
            "completely unrelated words here".to_owned(),
        ];
        let vectors = FakeEmbedder.embed(&texts).await.unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| x * y).sum()
        };
        assert!(
            dot(&vectors[0], &vectors[1]) > dot(&vectors[0], &vectors[2])
        );
    }

    #[tokio::test]
    async fn test_deterministic() {
        let texts = vec!["hello world".to_owned()];
        let a = FakeEmbedder.embed(&texts).await.unwrap();
        let b = FakeEmbedder.embed(&texts).await.unwrap();
        assert_eq!(a, b);
    }
}
