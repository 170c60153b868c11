//! Append-only JSONL feedback store.
//!
//! Every mutation is a new line: query records, corrections, and export
//! marks. State is derived by replaying the log, which keeps appends
//! atomic (one line per terminal event, written under a lock) and makes
//! export idempotent.

use crate::export::TrainingRow;
use crate::record::{QueryRecord, ToolCorrection};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown query id: {0}")]
    UnknownQid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The record sink contract the orchestrator writes through.
pub trait FeedbackSink: Send + Sync {
    /// Append the per-query record. Called exactly once per query, at
    /// the terminal state.
    fn append(&self, record: &QueryRecord) -> StoreResult<()>;

    /// Attach a per-tool correction to an existing record.
    fn attach_correction(&self, qid: &str, correction: &ToolCorrection) -> StoreResult<()>;

    /// Yield training rows not yet exported and mark them exported.
    fn export_training_rows(&self) -> StoreResult<Vec<TrainingRow>>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
enum LogEntry {
    Record(QueryRecord),
    Correction {
        qid: String,
        correction: ToolCorrection,
    },
    ExportMark {
        qids: Vec<String>,
    },
}

/// JSONL-file implementation of [`FeedbackSink`].
pub struct JsonlFeedbackStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlFeedbackStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_entry(&self, entry: &LogEntry) -> StoreResult<()> {
        let line = serde_json::to_string(entry)?;
        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn replay(&self) -> StoreResult<Replayed> {
        let _guard = self.lock.lock();

        let mut state = Replayed::default();
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(state),
            Err(e) => return Err(e.into()),
        };

        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(&line) {
                Ok(LogEntry::Record(record)) => {
                    state.records.insert(record.qid.clone(), record);
                }
                Ok(LogEntry::Correction { qid, correction }) => {
                    state.corrections.entry(qid).or_default().push(correction);
                }
                Ok(LogEntry::ExportMark { qids }) => {
                    state.exported.extend(qids);
                }
                Err(e) => {
                    warn!("Skipping malformed telemetry line: {}", e);
                }
            }
        }

        Ok(state)
    }
}

#[derive(Default)]
struct Replayed {
    records: HashMap<String, QueryRecord>,
    corrections: HashMap<String, Vec<ToolCorrection>>,
    exported: HashSet<String>,
}

impl FeedbackSink for JsonlFeedbackStore {
    fn append(&self, record: &QueryRecord) -> StoreResult<()> {
        debug!(qid = %record.qid, outcome = %record.outcome, "💾 Telemetry record appended");
        self.append_entry(&LogEntry::Record(record.clone()))
    }

    fn attach_correction(&self, qid: &str, correction: &ToolCorrection) -> StoreResult<()> {
        let state = self.replay()?;
        if !state.records.contains_key(qid) {
            return Err(StoreError::UnknownQid(qid.to_string()));
        }
        self.append_entry(&LogEntry::Correction {
            qid: qid.to_string(),
            correction: correction.clone(),
        })
    }

    fn export_training_rows(&self) -> StoreResult<Vec<TrainingRow>> {
        let state = self.replay()?;

        let mut rows = Vec::new();
        let mut newly_exported = Vec::new();

        let mut qids: Vec<&String> = state.records.keys().collect();
        qids.sort();

        for qid in qids {
            if state.exported.contains(qid.as_str()) {
                continue;
            }
            let record = &state.records[qid];
            let corrections = state.corrections.get(qid).map(Vec::as_slice).unwrap_or(&[]);
            rows.push(TrainingRow::from_record(record, corrections));
            newly_exported.push(qid.clone());
        }

        if !newly_exported.is_empty() {
            self.append_entry(&LogEntry::ExportMark {
                qids: newly_exported.clone(),
            })?;
            info!(rows = rows.len(), "📤 Training rows exported");
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loreweave_models::{StageTimings, Tool};
    use std::collections::BTreeMap;

    fn record(qid: &str) -> QueryRecord {
        let mut plan = BTreeMap::new();
        plan.insert(
            "character_data".to_string(),
            vec!["combat_info".to_string()],
        );
        QueryRecord {
            qid: qid.to_string(),
            timestamp: Utc::now(),
            query_text: "What's my AC?".to_string(),
            character_name: "Duskryn Nightwarden".to_string(),
            fastpath_hit: true,
            classifier_probs: None,
            risk: Some(0.02),
            abstain: false,
            plan,
            fallback: false,
            with_context: false,
            latency_ms: StageTimings::default(),
            token_counts: None,
            labels_gold: vec![],
            result_quality: None,
            outcome: "complete".to_string(),
        }
    }

    fn store() -> (tempfile::TempDir, JsonlFeedbackStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlFeedbackStore::new(dir.path().join("feedback.jsonl"));
        (dir, store)
    }

    #[test]
    fn append_then_export_yields_row_once() {
        let (_dir, store) = store();
        store.append(&record("q1")).unwrap();

        let first = store.export_training_rows().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].labels, vec!["character_data"]);

        // idempotent: second export yields nothing new
        let second = store.export_training_rows().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn corrections_override_predicted_labels() {
        let (_dir, store) = store();
        store.append(&record("q1")).unwrap();
        store
            .attach_correction(
                "q1",
                &ToolCorrection {
                    tool: Tool::SessionNotes,
                    should_have_fired: true,
                    corrected_intention: Some("npc_info".to_string()),
                },
            )
            .unwrap();

        let rows = store.export_training_rows().unwrap();
        assert!(rows[0].labels.contains(&"session_notes".to_string()));
        assert!(rows[0].labels.contains(&"character_data".to_string()));
        assert!(rows[0].corrected);
    }

    #[test]
    fn correction_for_unknown_qid_fails() {
        let (_dir, store) = store();
        let err = store
            .attach_correction(
                "missing",
                &ToolCorrection {
                    tool: Tool::Rulebook,
                    should_have_fired: false,
                    corrected_intention: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownQid(_)));
    }

    #[test]
    fn records_appended_after_export_are_picked_up_next_time() {
        let (_dir, store) = store();
        store.append(&record("q1")).unwrap();
        store.export_training_rows().unwrap();

        store.append(&record("q2")).unwrap();
        let rows = store.export_training_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].qid, "q2");
    }
}
