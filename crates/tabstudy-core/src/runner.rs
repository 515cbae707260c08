//! Sequential import runner: reads each data file, drives the row pipeline,
//! folds the results into the study-wide map, and runs the completeness
//! check. Also owns the manifest/catalog/table file formats and the gated
//! export write.

use crate::check::{CompletenessReport, check_completeness, render_completeness_summary};
use crate::domain::{
    DataSourceDescriptor, ImportError, ImportResult, SchemaCatalog, StudyMap, StudySchema,
};
use crate::mapper::{RowMapperRequest, map_file_rows};
use crate::merge::ImportContext;
use crate::normalize::{ResponseNormalizer, WordMatchNote};
use crate::rows::{EolMarker, split_rows};
use crate::tables::ResponseTables;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Import manifest file: the configured study id, an optional data root,
/// and the ordered data source descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportManifest {
    #[serde(rename = "studyId")]
    pub study_id: String,
    #[serde(rename = "dataRoot", default)]
    pub data_root: Option<String>,
    #[serde(rename = "dataSources")]
    pub sources: Vec<DataSourceDescriptor>,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub data_root: PathBuf,
    pub sources: Vec<DataSourceDescriptor>,
}

/// Per-file observability record; one entry per file listed in the
/// manifest, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileImportReport {
    pub path: String,
    pub browser_tag: Option<String>,
    pub task_group: Option<String>,
    pub read_ok: bool,
    pub eol: Option<&'static str>,
    pub row_count: usize,
    pub repaired_rows: usize,
    pub candidate_count: usize,
    pub marker_count: usize,
    pub count_mismatch: bool,
    pub key_row_found: bool,
    pub participant_count: usize,
    pub word_notes: Vec<WordMatchNote>,
    pub warnings: Vec<String>,
}

impl FileImportReport {
    fn new(path: &str, descriptor: &DataSourceDescriptor) -> Self {
        Self {
            path: path.to_string(),
            browser_tag: descriptor.browser_tag.clone(),
            task_group: descriptor.task_group_name.clone(),
            read_ok: false,
            eol: None,
            row_count: 0,
            repaired_rows: 0,
            candidate_count: 0,
            marker_count: 0,
            count_mismatch: false,
            key_row_found: false,
            participant_count: 0,
            word_notes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn mode_label(&self) -> String {
        match (&self.browser_tag, &self.task_group) {
            (Some(browser), Some(group)) => format!("as {}:{}", browser, group),
            (Some(browser), None) => format!("as {}", browser),
            (None, Some(group)) => format!("as {}", group),
            (None, None) => "as questionnaire".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub study_map: StudyMap,
    pub files: Vec<FileImportReport>,
    pub completeness: CompletenessReport,
}

/// Run the whole import strictly sequentially over the configured sources.
///
/// Per-file failures (unreadable file, missing key row, malformed rows)
/// degrade to reported conditions and the run continues; the returned
/// error covers only run-level setup.
pub fn run_import(
    config: &ImportConfig,
    schema: &StudySchema,
    tables: &ResponseTables,
) -> ImportResult<ImportOutcome> {
    let normalizer = ResponseNormalizer::new(tables)?;
    let mut context = ImportContext::new();
    let mut files = Vec::new();

    for descriptor in &config.sources {
        let group = descriptor.task_group_name.as_deref().and_then(|title| {
            let group = schema.group_titled(title);
            if group.is_none() {
                warn!(
                    group = title,
                    study = %schema.id,
                    "task group is not declared in the study schema"
                );
            }
            group
        });

        for file_path in &descriptor.file_paths {
            let mut report = FileImportReport::new(file_path, descriptor);
            info!(file = %file_path, mode = %report.mode_label(), "importing file");

            let full_path = config.data_root.join(file_path);
            let text = match fs::read_to_string(&full_path) {
                Ok(text) => text,
                Err(source) => {
                    warn!(
                        file = %full_path.display(),
                        error = %source,
                        "error loading data; file skipped"
                    );
                    files.push(report);
                    continue;
                }
            };
            report.read_ok = true;

            let split = split_rows(&text);
            report.eol = split.eol.map(EolMarker::name);
            report.row_count = split.rows.len();
            report.repaired_rows = split.repaired_rows;
            report.candidate_count = split.candidate_count;
            report.marker_count = split.marker_count;
            report.count_mismatch = split.count_mismatch();

            let mapped = map_file_rows(
                &RowMapperRequest {
                    rows: &split.rows,
                    key_label: &descriptor.key_label,
                    property_row_offsets: &descriptor.property_row_offsets,
                    group,
                    task_group_mode: descriptor.task_group_name.is_some(),
                },
                &normalizer,
            );
            report.key_row_found = mapped.key_row_found;
            report.participant_count = mapped.participants.len();
            report.word_notes = mapped.word_notes;
            report.warnings = mapped.warnings;

            context.merge_file_map(descriptor, mapped.data);
            files.push(report);
        }
    }

    let study_map = context.into_study_map();
    let completeness = check_completeness(&study_map, schema);

    Ok(ImportOutcome {
        study_map,
        files,
        completeness,
    })
}

/// Render the run's human-readable report: per-file lines, the
/// word-association section, the per-participant completeness lines, and
/// the overall status. Match summaries for word associations only appear
/// under verbose mode; misses always do.
pub fn render_import_summary(outcome: &ImportOutcome, verbose: bool) -> String {
    let mut lines = Vec::new();

    let imported = outcome.files.iter().filter(|file| file.read_ok).count();
    lines.push(format!(
        "Files: {} total ({} imported, {} skipped)",
        outcome.files.len(),
        imported,
        outcome.files.len() - imported
    ));

    for file in &outcome.files {
        lines.push(format!("Importing file '{}' {}", file.path, file.mode_label()));
        if !file.read_ok {
            lines.push("  error loading data; file skipped".to_string());
            continue;
        }
        let eol = file.eol.unwrap_or("none");
        lines.push(format!(
            "  eol={}, rows={}, repaired={}, participants={}",
            eol, file.row_count, file.repaired_rows, file.participant_count
        ));
        if file.count_mismatch {
            lines.push(format!(
                "  expected {} candidate rows to match {} marker instances",
                file.candidate_count, file.marker_count
            ));
        }
        if !file.key_row_found {
            lines.push("  key row not found; no property data".to_string());
        }
        for warning in &file.warnings {
            lines.push(format!("  warning: {}", warning));
        }
    }

    let word_notes: Vec<&WordMatchNote> = outcome
        .files
        .iter()
        .flat_map(|file| file.word_notes.iter())
        .collect();
    if !word_notes.is_empty() {
        lines.push("Checking word associations".to_string());
        let misses: Vec<&&WordMatchNote> =
            word_notes.iter().filter(|note| note.is_miss()).collect();
        if misses.is_empty() && !verbose {
            lines.push("All responses contained matches".to_string());
        } else {
            for note in &word_notes {
                if note.is_miss() || verbose {
                    lines.push(note.render_line());
                }
            }
        }
    }

    lines.push(render_completeness_summary(&outcome.completeness));
    lines.push(format!(
        "Import status: {}",
        if outcome.completeness.complete {
            "COMPLETE"
        } else {
            "INCOMPLETE"
        }
    ));

    lines.join("\n")
}

pub fn load_manifest(path: &Path) -> ImportResult<ImportManifest> {
    let content = fs::read_to_string(path).map_err(|source| {
        ImportError::io_system(
            "IO.MANIFEST_READ",
            format!("failed to read import manifest '{}': {}", path.display(), source),
        )
    })?;
    serde_json::from_str(&content).map_err(|source| {
        ImportError::input_validation(
            "INPUT.MANIFEST_PARSE",
            format!("failed to parse import manifest '{}': {}", path.display(), source),
        )
    })
}

pub fn load_schema_catalog(path: &Path) -> ImportResult<SchemaCatalog> {
    let content = fs::read_to_string(path).map_err(|source| {
        ImportError::io_system(
            "IO.CATALOG_READ",
            format!("failed to read schema catalog '{}': {}", path.display(), source),
        )
    })?;
    serde_json::from_str(&content).map_err(|source| {
        ImportError::input_validation(
            "INPUT.CATALOG_PARSE",
            format!("failed to parse schema catalog '{}': {}", path.display(), source),
        )
    })
}

pub fn load_response_tables(path: &Path) -> ImportResult<ResponseTables> {
    let content = fs::read_to_string(path).map_err(|source| {
        ImportError::io_system(
            "IO.TABLES_READ",
            format!("failed to read response tables '{}': {}", path.display(), source),
        )
    })?;
    serde_json::from_str(&content).map_err(|source| {
        ImportError::input_validation(
            "INPUT.TABLES_PARSE",
            format!("failed to parse response tables '{}': {}", path.display(), source),
        )
    })
}

/// Serialize the consolidated study map. Callers gate this on the
/// completeness result; the runner never writes it on its own.
pub fn write_export_file(path: &Path, study_map: &StudyMap) -> ImportResult<()> {
    let payload = serde_json::to_string(study_map).map_err(|source| {
        ImportError::internal(
            "SYS.EXPORT_SERIALIZE",
            format!("failed to serialize study map: {}", source),
        )
    })?;
    fs::write(path, payload).map_err(|source| {
        ImportError::io_system(
            "IO.EXPORT_WRITE",
            format!("failed to write export '{}': {}", path.display(), source),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{ImportConfig, load_manifest, run_import, write_export_file};
    use crate::domain::{
        CellValue, DataSourceDescriptor, Group, ResponseType, StudyMap, StudySchema, Task,
    };
    use crate::tables::ResponseTables;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn schema() -> StudySchema {
        StudySchema {
            id: "pilot-study".to_string(),
            groups: vec![Group {
                title: "Group A".to_string(),
                tasks: vec![Task {
                    id: "task_1".to_string(),
                    response_type: ResponseType::YesNoMaybe,
                }],
            }],
        }
    }

    fn offsets(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
        entries
            .iter()
            .map(|(name, offset)| (name.to_string(), *offset))
            .collect()
    }

    #[test]
    fn unreadable_files_are_skipped_and_the_run_continues() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(temp.path().join("present.txt"), "KEY\tP1\r\ntask_1\tYes\r\n")
            .expect("fixture should be written");

        let config = ImportConfig {
            data_root: temp.path().to_path_buf(),
            sources: vec![DataSourceDescriptor {
                file_paths: vec!["absent.txt".to_string(), "present.txt".to_string()],
                browser_tag: Some("chrome".to_string()),
                session_tag: None,
                timestamp_tag: None,
                task_group_name: Some("Group A".to_string()),
                key_label: "KEY".to_string(),
                property_row_offsets: offsets(&[("task_1", 0)]),
            }],
        };

        let tables = ResponseTables::default();
        let outcome = run_import(&config, &schema(), &tables).expect("import should run");

        assert_eq!(outcome.files.len(), 2);
        assert!(!outcome.files[0].read_ok);
        assert!(outcome.files[1].read_ok);
        assert!(outcome.completeness.complete);

        let record = &outcome.study_map["P1"];
        assert_eq!(record.browser.as_deref(), Some("chrome"));
        assert_eq!(record.task_group.as_deref(), Some("Group A"));
        assert_eq!(
            record.tasks.as_ref().and_then(|slots| slots[1].clone()),
            Some(CellValue::Number(1))
        );
    }

    #[test]
    fn manifest_parses_study_id_root_and_sources() {
        let temp = TempDir::new().expect("tempdir should be created");
        let manifest_path = temp.path().join("study-manifest.json");
        fs::write(
            &manifest_path,
            r#"
            {
              "studyId": "pilot-study",
              "dataRoot": "data",
              "dataSources": [
                {
                  "filePaths": ["chrome-a.txt"],
                  "browserTag": "chrome",
                  "sessionTag": "s1",
                  "taskGroupName": "Group A",
                  "keyLabel": "ParticipantID",
                  "propertyRowOffsets": { "task_1": 1 }
                }
              ]
            }
            "#,
        )
        .expect("manifest should be written");

        let manifest = load_manifest(&manifest_path).expect("manifest should load");
        assert_eq!(manifest.study_id, "pilot-study");
        assert_eq!(manifest.data_root.as_deref(), Some("data"));
        assert_eq!(manifest.sources.len(), 1);
        assert_eq!(manifest.sources[0].key_label, "ParticipantID");
    }

    #[test]
    fn malformed_manifest_reports_a_parse_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let manifest_path = temp.path().join("study-manifest.json");
        fs::write(&manifest_path, "{ not json").expect("manifest should be written");

        let error = load_manifest(&manifest_path).expect_err("parse should fail");
        assert_eq!(error.placeholder(), "INPUT.MANIFEST_PARSE");

        let missing = load_manifest(&temp.path().join("nope.json"))
            .expect_err("read should fail");
        assert_eq!(missing.placeholder(), "IO.MANIFEST_READ");
    }

    #[test]
    fn export_file_round_trips_through_json() {
        let temp = TempDir::new().expect("tempdir should be created");
        let export_path = temp.path().join("export.json");

        let mut study_map = StudyMap::new();
        study_map.insert("P1".to_string(), Default::default());
        write_export_file(&export_path, &study_map).expect("export should write");

        let parsed: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(&export_path).expect("export should be readable"),
        )
        .expect("export JSON should parse");
        assert!(parsed.get("P1").is_some());
    }
}
