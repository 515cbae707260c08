//! Logical row extraction from raw export text and key-row resolution.
//!
//! Early study exports mixed end-of-line conventions inside one file, so
//! splitting on the detected marker is followed by a repair pass that
//! re-expands rows still carrying a different marker.

use crate::domain::ParticipantId;
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EolMarker {
    CrLf,
    Lf,
    Cr,
}

impl EolMarker {
    /// Strict detection priority: CRLF wins over LF wins over CR.
    pub const DETECTION_ORDER: [EolMarker; 3] = [Self::CrLf, Self::Lf, Self::Cr];

    pub const fn token(self) -> &'static str {
        match self {
            Self::CrLf => "\r\n",
            Self::Lf => "\n",
            Self::Cr => "\r",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::CrLf => "carriage return + new line",
            Self::Lf => "new line",
            Self::Cr => "carriage return",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSplitOutcome {
    pub rows: Vec<String>,
    pub eol: Option<EolMarker>,
    /// Occurrences of the selected marker in the raw text.
    pub marker_count: usize,
    /// Row count after the initial split, before repair.
    pub candidate_count: usize,
    /// Candidate rows that still carried a marker and were re-expanded.
    pub repaired_rows: usize,
}

impl RowSplitOutcome {
    /// The candidate count is expected to equal the marker count, or that
    /// count + 1 when the text does not end with the marker.
    pub fn count_mismatch(&self) -> bool {
        self.eol.is_some()
            && self.candidate_count != self.marker_count
            && self.candidate_count != self.marker_count + 1
    }
}

/// Split one file's full text into logical rows.
///
/// The first marker in [`EolMarker::DETECTION_ORDER`] with at least one
/// occurrence is selected as the file's convention; a text containing no
/// marker at all is a single row. Candidate rows that still contain any
/// marker are expanded in place, preserving order, until no row carries one.
pub fn split_rows(text: &str) -> RowSplitOutcome {
    let selected = EolMarker::DETECTION_ORDER
        .into_iter()
        .find_map(|marker| {
            let count = text.matches(marker.token()).count();
            (count > 0).then_some((marker, count))
        });

    let Some((eol, marker_count)) = selected else {
        return RowSplitOutcome {
            rows: vec![text.to_string()],
            eol: None,
            marker_count: 0,
            candidate_count: 1,
            repaired_rows: 0,
        };
    };

    debug!(
        eol = eol.name(),
        instances = marker_count,
        "selected end-of-line marker"
    );

    let candidates: Vec<&str> = text.split(eol.token()).collect();
    let candidate_count = candidates.len();

    let mut rows = Vec::with_capacity(candidate_count);
    let mut repaired_rows = 0;

    for (index, candidate) in candidates.into_iter().enumerate() {
        let row_number = index + 1;
        let mut pending: VecDeque<String> = VecDeque::new();
        pending.push_back(candidate.to_string());
        let mut candidate_repaired = false;

        while let Some(row) = pending.pop_front() {
            let Some(marker) = embedded_marker(&row) else {
                rows.push(row);
                continue;
            };

            let parts: Vec<&str> = row.split(marker.token()).collect();
            if parts.len() < 2 {
                // No-progress guard; a detected marker always splits, but a
                // row must never be re-queued unchanged.
                rows.push(row);
                continue;
            }

            debug!(
                row = row_number,
                marker = marker.name(),
                parts = parts.len(),
                "expanding row with embedded end-of-line marker"
            );
            candidate_repaired = true;
            for part in parts.into_iter().rev() {
                pending.push_front(part.to_string());
            }
        }

        if candidate_repaired {
            repaired_rows += 1;
        }
    }

    let outcome = RowSplitOutcome {
        rows,
        eol: Some(eol),
        marker_count,
        candidate_count,
        repaired_rows,
    };

    if outcome.count_mismatch() {
        warn!(
            candidate_rows = outcome.candidate_count,
            marker_instances = outcome.marker_count,
            "row count does not match end-of-line marker count"
        );
    }

    outcome
}

fn embedded_marker(row: &str) -> Option<EolMarker> {
    EolMarker::DETECTION_ORDER
        .into_iter()
        .find(|marker| row.contains(marker.token()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRow {
    pub row_index: usize,
    pub participants: Vec<ParticipantId>,
}

/// Find the first row whose first tab-separated cell equals `key_label` and
/// derive the ordered participant-id sequence from its remaining cells.
pub fn resolve_key_row(rows: &[String], key_label: &str) -> Option<KeyRow> {
    let row_index = rows
        .iter()
        .position(|row| row.split('\t').next() == Some(key_label))?;

    let participants = rows[row_index]
        .split('\t')
        .skip(1)
        .map(str::to_string)
        .collect();

    Some(KeyRow {
        row_index,
        participants,
    })
}
