use crate::error::Result;
use async_trait::async_trait;

/// Turns text into a fixed-dimension dense vector. The dimension is
/// determined by the adapter/model and must stay uniform across everything
/// the Vault stores; the rest of the system is dimension-agnostic.
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    /// Embeds `text`. Must succeed even for an empty string; never returns
    /// a zero vector (callers rely on this to distinguish "no embedding"
    /// from "embedding of nothing").
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// The dimension this adapter's vectors carry.
    fn dimension(&self) -> usize;
}

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use super::*;

    /// A deterministic, dependency-free embedding fake: hashes the input
    /// into a fixed-size vector so equal inputs give equal vectors and
    /// distinct inputs are (almost certainly) distinct.
    pub struct FakeEmbedder {
        pub dim: usize,
    }

    #[async_trait]
    impl EmbeddingAdapter for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0_f32; self.dim];
            for (i, byte) in text.bytes().enumerate() {
                v[i % self.dim] += byte as f32 / 255.0;
            }
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for x in v.iter_mut() {
                    *x /= norm;
                }
            } else {
                v[0] = 1.0;
            }
            Ok(v)
        }

        fn dimension(&self) -> usize {
            self.dim
        }
    }
}
