//! Per-file row mapping: turn one file's logical rows into a mapping from
//! participant id to a flat property record (questionnaire mode) or an
//! ordered task slot array (task-group mode).

use crate::domain::{FileDataMap, FileRecord, Group, ParticipantId};
use crate::normalize::{ResponseNormalizer, WordMatchNote};
use crate::rows::resolve_key_row;
use std::collections::BTreeMap;
use tracing::warn;

/// Task property names carry a fixed-width prefix (`task_`) ahead of the
/// numeric task index.
pub const TASK_PREFIX_LEN: usize = 5;

#[derive(Debug, Clone)]
pub struct RowMapperRequest<'a> {
    pub rows: &'a [String],
    pub key_label: &'a str,
    /// Property name to signed row offset; the target row holding the
    /// values sits at the property row's index plus the offset.
    pub property_row_offsets: &'a BTreeMap<String, i64>,
    /// Resolved schema group supplying response types for task lookups.
    pub group: Option<&'a Group>,
    /// Task-group mode follows the descriptor's declaration even when the
    /// group title is unknown to the schema.
    pub task_group_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMapOutcome {
    pub data: FileDataMap,
    pub key_row_found: bool,
    pub participants: Vec<ParticipantId>,
    pub word_notes: Vec<WordMatchNote>,
    /// Recoverable data-integrity conditions: column misalignment,
    /// out-of-range target rows, unparseable task indices.
    pub warnings: Vec<String>,
}

/// Build the per-file participant map. Never fails: a missing key row
/// yields an empty map, and every malformed row degrades to a reported
/// warning.
pub fn map_file_rows(
    request: &RowMapperRequest<'_>,
    normalizer: &ResponseNormalizer<'_>,
) -> FileMapOutcome {
    let mut outcome = FileMapOutcome::default();

    let Some(key_row) = resolve_key_row(request.rows, request.key_label) else {
        warn!(
            key = request.key_label,
            "key row not found; file yields no property data"
        );
        return outcome;
    };
    outcome.key_row_found = true;
    outcome.participants = key_row.participants;

    for (row_index, row) in request.rows.iter().enumerate() {
        let prop_name = row.split('\t').next().unwrap_or_default();
        let Some(&offset) = request.property_row_offsets.get(prop_name) else {
            continue;
        };

        let Some(target_index) = target_row_index(row_index, offset, request.rows.len()) else {
            let message = format!(
                "property '{}' at row {} points {} rows away, outside the file; treated as empty",
                prop_name,
                row_index + 1,
                offset
            );
            warn!(
                property = prop_name,
                row = row_index + 1,
                offset,
                "target row out of range; treated as empty"
            );
            outcome.warnings.push(message);
            continue;
        };

        let cells: Vec<&str> = request.rows[target_index].split('\t').skip(1).collect();

        if cells.len() != outcome.participants.len() {
            let message = format!(
                "property '{}' row {} carries {} value cells for {} participants",
                prop_name,
                target_index + 1,
                cells.len(),
                outcome.participants.len()
            );
            warn!(
                property = prop_name,
                cells = cells.len(),
                participants = outcome.participants.len(),
                "column alignment mismatch"
            );
            outcome.warnings.push(message);
        }

        let task_index = if request.task_group_mode {
            match prop_name
                .get(TASK_PREFIX_LEN..)
                .and_then(|suffix| suffix.parse::<usize>().ok())
            {
                Some(index) => Some(index),
                None => {
                    let message = format!(
                        "property '{}' does not carry a numeric task index; row skipped",
                        prop_name
                    );
                    warn!(property = prop_name, "property has no numeric task index");
                    outcome.warnings.push(message);
                    continue;
                }
            }
        } else {
            None
        };

        let task = request.group.and_then(|group| group.task_named(prop_name));

        for (column, cell) in cells.iter().enumerate() {
            // Cells beyond the participant list have no identifier to key
            // by; the alignment warning above covers them.
            let Some(participant) = outcome.participants.get(column) else {
                break;
            };

            let normalized = normalizer.normalize(cell, task, participant);
            if let Some(note) = normalized.word_note {
                outcome.word_notes.push(note);
            }

            match task_index {
                Some(index) => {
                    let record = outcome
                        .data
                        .entry(participant.clone())
                        .or_insert_with(|| FileRecord::Tasks(Vec::new()));
                    let FileRecord::Tasks(slots) = record else {
                        continue;
                    };
                    if slots.len() <= index {
                        slots.resize(index + 1, None);
                    }
                    slots[index] = normalized.value;
                }
                None => {
                    let record = outcome
                        .data
                        .entry(participant.clone())
                        .or_insert_with(|| FileRecord::Flat(BTreeMap::new()));
                    let FileRecord::Flat(properties) = record else {
                        continue;
                    };
                    match normalized.value {
                        Some(value) => {
                            properties.insert(prop_name.to_string(), value);
                        }
                        None => {
                            // A later missing value still overrides an
                            // earlier recorded one.
                            properties.remove(prop_name);
                        }
                    }
                }
            }
        }
    }

    outcome
}

fn target_row_index(row_index: usize, offset: i64, row_count: usize) -> Option<usize> {
    let target = row_index as i64 + offset;
    (0..row_count as i64)
        .contains(&target)
        .then_some(target as usize)
}
