//! Completeness validation of the merged study map against the study
//! schema. Any missing task response anywhere in the run suppresses the
//! export (fail-closed).

use crate::domain::{ParticipantId, ParticipantRecord, StudyMap, StudySchema};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Ok,
    /// 1-based task indices with no recorded value.
    MissingTasks(Vec<usize>),
    /// The record never received a task-group tag; there is nothing to
    /// validate against, so the run fails closed.
    NoTaskGroup,
    /// The record's group title does not exist in the study schema.
    UnknownTaskGroup(String),
}

impl CheckStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantCheck {
    pub participant: ParticipantId,
    pub task_group: Option<String>,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    /// Sorted by participant identifier.
    pub participants: Vec<ParticipantCheck>,
    /// True iff no participant across the whole run has any missing task.
    pub complete: bool,
}

/// Validate every participant's task slots against their group's declared
/// task count. Participants are visited in sorted identifier order.
pub fn check_completeness(study_map: &StudyMap, schema: &StudySchema) -> CompletenessReport {
    let mut participants = Vec::with_capacity(study_map.len());
    let mut complete = true;

    for (id, record) in study_map {
        let status = participant_status(record, schema);
        if !status.is_ok() {
            complete = false;
        }
        participants.push(ParticipantCheck {
            participant: id.clone(),
            task_group: record.task_group.clone(),
            status,
        });
    }

    CompletenessReport {
        participants,
        complete,
    }
}

fn participant_status(record: &ParticipantRecord, schema: &StudySchema) -> CheckStatus {
    let Some(group_title) = &record.task_group else {
        return CheckStatus::NoTaskGroup;
    };
    let Some(group) = schema.group_titled(group_title) else {
        return CheckStatus::UnknownTaskGroup(group_title.clone());
    };

    let missing: Vec<usize> = (1..=group.tasks.len())
        .filter(|&index| {
            record
                .tasks
                .as_ref()
                .and_then(|slots| slots.get(index))
                .and_then(Option::as_ref)
                .is_none()
        })
        .collect();

    if missing.is_empty() {
        CheckStatus::Ok
    } else {
        CheckStatus::MissingTasks(missing)
    }
}

/// Numbered per-participant status lines plus the gate decision, in the
/// shape the import log has always used.
pub fn render_completeness_summary(report: &CompletenessReport) -> String {
    let mut lines = vec!["Confirming participant data".to_string()];

    for (index, check) in report.participants.iter().enumerate() {
        let group = check.task_group.as_deref().unwrap_or("-");
        let status = match &check.status {
            CheckStatus::Ok => " -> checked:ok".to_string(),
            CheckStatus::MissingTasks(missing) => {
                let joined = missing
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                format!(" -> checked:missing[{}]", joined)
            }
            CheckStatus::NoTaskGroup => " -> checked:no-task-group".to_string(),
            CheckStatus::UnknownTaskGroup(title) => {
                format!(" -> checked:unknown-group[{}]", title)
            }
        };
        lines.push(format!(
            "{}) {} ({}){}",
            index + 1,
            check.participant,
            group,
            status
        ));
    }

    lines.join("\n")
}
