//! Few-shot backend: a quantized linear head over the fixed hashing
//! embedding, trained offline and shipped as a JSON weight artifact.
//!
//! Weights are stored as i8 with one scale per output row. Inference is
//! a single matvec, well inside the latency budget.

use super::{ClassifierBackend, NUM_LABELS};
use crate::embedder::{LocalEmbedder, EMBED_DIM};
use crate::errors::{RouterError, RouterResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// On-disk weight artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightArtifact {
    /// Embedding dimensionality the head was trained against
    pub embed_dim: usize,
    /// Row-major quantized weights, `labels × embed_dim`
    pub weights_q8: Vec<Vec<i8>>,
    /// Dequantization scale per row
    pub scales: Vec<f32>,
    /// Bias per row
    pub biases: Vec<f32>,
}

pub struct FewShotHead {
    embedder: LocalEmbedder,
    /// Dequantized rows, `NUM_LABELS × EMBED_DIM`
    weights: Vec<Vec<f32>>,
    biases: Vec<f32>,
}

impl FewShotHead {
    pub fn from_file(path: impl AsRef<Path>) -> RouterResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let artifact: WeightArtifact = serde_json::from_str(&raw)?;
        let head = Self::from_artifact(artifact)?;
        info!("✓ Few-shot head loaded from {}", path.as_ref().display());
        Ok(head)
    }

    pub fn from_artifact(artifact: WeightArtifact) -> RouterResult<Self> {
        if artifact.embed_dim != EMBED_DIM {
            return Err(RouterError::Artifact(format!(
                "artifact embed_dim {} does not match embedder dim {}",
                artifact.embed_dim, EMBED_DIM
            )));
        }
        if artifact.weights_q8.len() != NUM_LABELS
            || artifact.scales.len() != NUM_LABELS
            || artifact.biases.len() != NUM_LABELS
        {
            return Err(RouterError::Artifact(format!(
                "artifact has {} rows, expected {}",
                artifact.weights_q8.len(),
                NUM_LABELS
            )));
        }

        let mut weights = Vec::with_capacity(NUM_LABELS);
        for (row, scale) in artifact.weights_q8.iter().zip(&artifact.scales) {
            if row.len() != EMBED_DIM {
                return Err(RouterError::Artifact(format!(
                    "weight row has {} entries, expected {}",
                    row.len(),
                    EMBED_DIM
                )));
            }
            weights.push(row.iter().map(|q| f32::from(*q) * scale).collect());
        }

        Ok(Self {
            embedder: LocalEmbedder::new(),
            weights,
            biases: artifact.biases,
        })
    }
}

impl ClassifierBackend for FewShotHead {
    fn name(&self) -> &'static str {
        "few_shot"
    }

    fn logits(&self, query: &str) -> [f32; NUM_LABELS] {
        let embedding = self.embedder.embed(query);

        let mut logits = [0.0f32; NUM_LABELS];
        for (idx, (row, bias)) in self.weights.iter().zip(&self.biases).enumerate() {
            logits[idx] = row
                .iter()
                .zip(&embedding)
                .map(|(w, x)| w * x)
                .sum::<f32>()
                + bias;
        }
        logits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> WeightArtifact {
        WeightArtifact {
            embed_dim: EMBED_DIM,
            weights_q8: vec![vec![1i8; EMBED_DIM]; NUM_LABELS],
            scales: vec![0.01; NUM_LABELS],
            biases: vec![0.0, 0.1, 0.2, 0.3],
        }
    }

    #[test]
    fn loads_well_formed_artifact() {
        let head = FewShotHead::from_artifact(artifact()).unwrap();
        let logits = head.logits("what is my armor class");
        assert_eq!(logits.len(), NUM_LABELS);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let mut bad = artifact();
        bad.embed_dim = 64;
        assert!(matches!(
            FewShotHead::from_artifact(bad),
            Err(RouterError::Artifact(_))
        ));
    }

    #[test]
    fn rejects_wrong_row_count() {
        let mut bad = artifact();
        bad.weights_q8.pop();
        bad.scales.pop();
        bad.biases.pop();
        assert!(matches!(
            FewShotHead::from_artifact(bad),
            Err(RouterError::Artifact(_))
        ));
    }

    #[test]
    fn bias_shifts_logits() {
        let head = FewShotHead::from_artifact(artifact()).unwrap();
        let logits = head.logits("anything at all");
        // identical rows, increasing biases
        assert!(logits[3] > logits[0]);
    }
}
