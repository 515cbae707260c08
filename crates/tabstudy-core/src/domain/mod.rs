pub mod errors;

pub use errors::{ImportError, ImportErrorCategory, ImportResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable respondent identifier taken from the key row of a source file.
pub type ParticipantId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseType {
    YesNoMaybe,
    TimeOnTask,
    SatisfactionScale,
    AgreementScale,
    WordAssociation,
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "responseType", default)]
    pub response_type: ResponseType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub title: String,
    pub tasks: Vec<Task>,
}

impl Group {
    pub fn task_named(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySchema {
    pub id: String,
    pub groups: Vec<Group>,
}

impl StudySchema {
    pub fn group_titled(&self, title: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    pub studies: Vec<StudySchema>,
}

impl SchemaCatalog {
    pub fn find_study(&self, study_id: &str) -> Option<&StudySchema> {
        self.studies.iter().find(|study| study.id == study_id)
    }
}

/// One externally-supplied source of tab-delimited data files. Files in
/// `file_paths` are processed in order and share the key label, the
/// property-row offsets, and the optional browser/session/timestamp and
/// task-group tags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSourceDescriptor {
    #[serde(rename = "filePaths")]
    pub file_paths: Vec<String>,
    #[serde(rename = "browserTag", default)]
    pub browser_tag: Option<String>,
    #[serde(rename = "sessionTag", default)]
    pub session_tag: Option<String>,
    #[serde(rename = "timestampTag", default)]
    pub timestamp_tag: Option<String>,
    #[serde(rename = "taskGroupName", default)]
    pub task_group_name: Option<String>,
    #[serde(rename = "keyLabel")]
    pub key_label: String,
    #[serde(rename = "propertyRowOffsets")]
    pub property_row_offsets: BTreeMap<String, i64>,
}

/// Structured value extracted from a `timecode:::url` compound cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClipReference {
    #[serde(rename = "offsetSeconds")]
    pub offset_seconds: u32,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: u32,
}

/// A normalized cell value. A missing value is the absence of a `CellValue`
/// (an `Option` in caller context), never a variant of this enum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(i64),
    Clip(ClipReference),
    Words(BTreeMap<String, usize>),
    Text(String),
}

/// Per-file record shape: an ordered task slot array in task-group mode, a
/// flat property map in questionnaire mode.
#[derive(Debug, Clone, PartialEq)]
pub enum FileRecord {
    Tasks(Vec<Option<CellValue>>),
    Flat(BTreeMap<String, CellValue>),
}

pub type FileDataMap = BTreeMap<ParticipantId, FileRecord>;

/// Study-wide merged record for one participant. Serializes to the export
/// shape: `__`-prefixed metadata keys plus the flattened questionnaire
/// properties; sparse task slots serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParticipantRecord {
    #[serde(rename = "__browser", skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(rename = "__session", skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(rename = "__timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "__taskGroup", skip_serializing_if = "Option::is_none")]
    pub task_group: Option<String>,
    #[serde(rename = "__tasks", skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Option<CellValue>>>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, CellValue>,
}

pub type StudyMap = BTreeMap<ParticipantId, ParticipantRecord>;
