//! Run-scoped accumulation of per-file maps into the study-wide map.

use crate::domain::{DataSourceDescriptor, FileDataMap, FileRecord, StudyMap};

/// Explicit run context owning the accumulating study-wide map; threaded
/// through the merge step instead of living as ambient state.
#[derive(Debug, Clone, Default)]
pub struct ImportContext {
    study_map: StudyMap,
}

impl ImportContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn study_map(&self) -> &StudyMap {
        &self.study_map
    }

    pub fn into_study_map(self) -> StudyMap {
        self.study_map
    }

    /// Fold one file's map into the study-wide map.
    ///
    /// Browser/session/timestamp tags stamp the record whenever the
    /// descriptor carries them, last writer wins. A declared task group
    /// replaces the record's group title and task array wholesale (a
    /// participant is expected to belong to exactly one group across the
    /// run). Questionnaire records shallow-merge: new property keys are
    /// added, existing keys overwritten.
    pub fn merge_file_map(&mut self, descriptor: &DataSourceDescriptor, file_map: FileDataMap) {
        for (participant, file_record) in file_map {
            let record = self.study_map.entry(participant).or_default();

            if let Some(browser) = &descriptor.browser_tag {
                record.browser = Some(browser.clone());
            }
            if let Some(session) = &descriptor.session_tag {
                record.session = Some(session.clone());
            }
            if let Some(timestamp) = &descriptor.timestamp_tag {
                record.timestamp = Some(timestamp.clone());
            }

            match file_record {
                FileRecord::Tasks(slots) => {
                    record.task_group = descriptor.task_group_name.clone();
                    record.tasks = Some(slots);
                }
                FileRecord::Flat(properties) => {
                    record.properties.extend(properties);
                }
            }
        }
    }
}
