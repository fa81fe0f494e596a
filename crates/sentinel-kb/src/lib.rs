//! Knowledge base record store and keyword matcher.
//!
//! The store is an append-only line-delimited JSON file (one record per line)
//! owned and curated externally; the core only ever reads it. The matcher is
//! a stateless query: score each record by keyword overlap with the request
//! text, return the best, or `None` when nothing overlaps at all.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use sentinel_types::{GateError, Result};

/// One stored trap pattern. Read-only from the core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbRecord {
    pub keywords: BTreeSet<String>,
    pub template: String,
    pub risk_category: String,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

/// In-memory snapshot of the record store.
#[derive(Debug, Clone, Default)]
pub struct KbStore {
    records: Vec<KbRecord>,
}

impl KbStore {
    /// Build a store from already-loaded records. File order is preserved;
    /// later records win score ties with equal timestamps.
    pub fn from_records(records: Vec<KbRecord>) -> Self {
        Self { records }
    }

    /// Read a JSONL record store from `path`. Blank lines are tolerated; a
    /// malformed line is an error with its line number, never silently
    /// dropped.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut records = Vec::new();
        for (idx, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: KbRecord =
                serde_json::from_str(line).map_err(|e| GateError::MalformedRecord {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            records.push(record);
        }
        tracing::debug!(path = %path.display(), count = records.len(), "Knowledge base loaded");
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the record whose keywords best overlap `text` (case-insensitive
    /// substring match per keyword). Ties broken by most-recently-recorded,
    /// then by latest file position. A zero score returns `None` — degrading
    /// to a generic template is the caller's job.
    pub fn lookup(&self, text: &str) -> Option<&KbRecord> {
        let haystack = text.to_lowercase();
        let mut best: Option<(usize, &KbRecord)> = None;
        for record in &self.records {
            let score = record
                .keywords
                .iter()
                .filter(|kw| haystack.contains(&kw.to_lowercase()))
                .count();
            if score == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_score, best_record)) => {
                    score > best_score
                        || (score == best_score && record.recorded_at >= best_record.recorded_at)
                }
            };
            if better {
                best = Some((score, record));
            }
        }
        best.map(|(_, record)| record)
    }
}
