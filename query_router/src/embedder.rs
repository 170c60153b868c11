//! Deterministic feature-hashing embedder.
//!
//! The local classifier and context detector must run on CPU inside the
//! latency budget, so they use a fixed hashing embedder rather than the
//! engine's embedding provider. Word unigrams and bigrams are hashed
//! (FNV-1a, fixed seed) into a 256-dim vector, L2-normalized.

/// Embedding dimensionality. Matches the few-shot weight artifact.
pub const EMBED_DIM: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Default)]
pub struct LocalEmbedder;

impl LocalEmbedder {
    pub fn new() -> Self {
        Self
    }

    /// Embed a text. Deterministic: identical input yields identical output.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBED_DIM];

        let tokens: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        for token in &tokens {
            bump(&mut vector, token);
        }
        for pair in tokens.windows(2) {
            bump(&mut vector, &format!("{} {}", pair[0], pair[1]));
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

fn bump(vector: &mut [f32], feature: &str) {
    let hash = fnv1a(feature.as_bytes());
    let slot = (hash % EMBED_DIM as u64) as usize;
    // Sign bit from a higher hash bit keeps buckets roughly zero-centered
    let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
    vector[slot] += sign;
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Cosine similarity between two equal-length vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic() {
        let embedder = LocalEmbedder::new();
        assert_eq!(
            embedder.embed("what's my armor class"),
            embedder.embed("what's my armor class")
        );
    }

    #[test]
    fn embedding_is_normalized() {
        let embedder = LocalEmbedder::new();
        let vector = embedder.embed("who is Elara");
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn similar_texts_score_higher_than_unrelated() {
        let embedder = LocalEmbedder::new();
        let a = embedder.embed("what is my armor class");
        let b = embedder.embed("tell me my armor class");
        let c = embedder.embed("the moons of jupiter orbit quickly");

        assert!(cosine(&a, &b) > cosine(&a, &c));
    }
}
