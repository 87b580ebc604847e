//! Joins messages with their annotations and cleans the result.
//!
//! The join is inner on message id. Messages without an annotation and
//! annotations without a message are counted and skipped, not invented.
//! When the same id is annotated twice the first annotation wins; a second
//! annotation with a different encoding is counted as a conflict. Label
//! values above 1 (the annotation export contains a handful of 2s on the
//! `related` column) are clamped to 1 and counted as repairs. Finally,
//! rows that are identical in every column are collapsed to one.

use crisistriage_core::{
    CategoryRecord, CategoryVector, LabeledMessage, MessageRecord, Result, TriageError,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Counters describing what one ETL run did to the raw exports.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EtlSummary {
    /// Rows read from the messages export.
    pub messages_read: usize,
    /// Rows read from the annotation export.
    pub annotations_read: usize,
    /// Repeated annotations for an id with an identical encoding.
    pub duplicate_annotations: usize,
    /// Repeated annotations for an id with a different encoding; the first
    /// one was kept.
    pub conflicting_annotations: usize,
    /// Messages dropped because no annotation exists for their id.
    pub missing_annotations: usize,
    /// Annotations whose id matches no message.
    pub orphan_annotations: usize,
    /// Label values above 1 that were clamped down to 1.
    pub repaired_labels: usize,
    /// Fully identical rows removed after the join.
    pub duplicates_removed: usize,
    /// Rows that survived cleaning and go to storage.
    pub rows_kept: usize,
}

impl fmt::Display for EtlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {:<28} {:>8}", "messages read", self.messages_read)?;
        writeln!(f, "  {:<28} {:>8}", "annotations read", self.annotations_read)?;
        writeln!(f, "  {:<28} {:>8}", "duplicate annotations", self.duplicate_annotations)?;
        writeln!(f, "  {:<28} {:>8}", "conflicting annotations", self.conflicting_annotations)?;
        writeln!(f, "  {:<28} {:>8}", "messages without annotation", self.missing_annotations)?;
        writeln!(f, "  {:<28} {:>8}", "annotations without message", self.orphan_annotations)?;
        writeln!(f, "  {:<28} {:>8}", "label values repaired", self.repaired_labels)?;
        writeln!(f, "  {:<28} {:>8}", "duplicate rows removed", self.duplicates_removed)?;
        write!(f, "  {:<28} {:>8}", "rows kept", self.rows_kept)
    }
}

/// Cleaned rows plus the counters produced while cleaning them.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub rows: Vec<LabeledMessage>,
    pub summary: EtlSummary,
}

/// Joins `messages` with `annotations` on id and normalizes the result.
///
/// Message order is preserved. Fails on the first annotation string that
/// does not parse as the 36-token category encoding.
pub fn merge_and_clean(
    messages: &[MessageRecord],
    annotations: &[CategoryRecord],
) -> Result<MergeOutcome> {
    let mut summary = EtlSummary {
        messages_read: messages.len(),
        annotations_read: annotations.len(),
        ..EtlSummary::default()
    };

    // First annotation per id wins; later ones are duplicates or conflicts.
    let mut by_id: HashMap<i64, &str> = HashMap::with_capacity(annotations.len());
    for record in annotations {
        match by_id.get(&record.id) {
            None => {
                by_id.insert(record.id, record.categories.as_str());
            }
            Some(kept) if *kept == record.categories => {
                summary.duplicate_annotations += 1;
            }
            Some(_) => {
                debug!(id = record.id, "conflicting annotation, keeping first");
                summary.conflicting_annotations += 1;
            }
        }
    }

    let mut matched: HashSet<i64> = HashSet::with_capacity(messages.len());
    let mut rows: Vec<LabeledMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        let Some(raw) = by_id.get(&message.id) else {
            debug!(id = message.id, "message has no annotation, skipping");
            summary.missing_annotations += 1;
            continue;
        };
        let mut labels: CategoryVector = raw.parse().map_err(|e| match e {
            TriageError::Label(msg) => {
                TriageError::Label(format!("message {}: {msg}", message.id))
            }
            other => other,
        })?;
        summary.repaired_labels += labels.clamp_binary();
        matched.insert(message.id);
        rows.push(LabeledMessage {
            id: message.id,
            message: message.message.clone(),
            original: message.original.clone(),
            genre: message.genre.clone(),
            labels,
        });
    }
    summary.orphan_annotations = by_id.len() - matched.len();

    // Collapse rows identical in every column, keeping first occurrences.
    let mut seen: HashSet<LabeledMessage> = HashSet::with_capacity(rows.len());
    let mut kept: Vec<LabeledMessage> = Vec::with_capacity(rows.len());
    for row in rows {
        if seen.insert(row.clone()) {
            kept.push(row);
        } else {
            summary.duplicates_removed += 1;
        }
    }
    summary.rows_kept = kept.len();

    Ok(MergeOutcome { rows: kept, summary })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
