//! Training-row export for the few-shot routing head.

use crate::record::{QueryRecord, ToolCorrection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One supervised example: query text plus the tool labels that should
/// have fired. Corrections take precedence over the executed plan; gold
/// labels take precedence over both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRow {
    pub qid: String,
    pub query_text: String,
    pub labels: Vec<String>,
    /// True when any user correction shaped the labels
    pub corrected: bool,
}

impl TrainingRow {
    pub fn from_record(record: &QueryRecord, corrections: &[ToolCorrection]) -> Self {
        if !record.labels_gold.is_empty() {
            return Self {
                qid: record.qid.clone(),
                query_text: record.query_text.clone(),
                labels: record.labels_gold.clone(),
                corrected: false,
            };
        }

        let mut labels: BTreeSet<String> = record.predicted_labels().into_iter().collect();
        for correction in corrections {
            let label = correction.tool.as_str().to_string();
            if correction.should_have_fired {
                labels.insert(label);
            } else {
                labels.remove(&label);
            }
        }

        Self {
            qid: record.qid.clone(),
            query_text: record.query_text.clone(),
            labels: labels.into_iter().collect(),
            corrected: !corrections.is_empty(),
        }
    }
}
