use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SCHEMAS: &str = r#"
{
  "studies": [
    {
      "id": "usability-pilot",
      "groups": [
        {
          "title": "Group A",
          "tasks": [
            { "id": "task_1", "responseType": "yesNoMaybe" },
            { "id": "task_2", "responseType": "agreementScale" }
          ]
        }
      ]
    }
  ]
}
"#;

fn manifest_json(study_id: &str) -> String {
    format!(
        r#"
        {{
          "studyId": "{}",
          "dataRoot": "data",
          "dataSources": [
            {{
              "filePaths": ["chrome-a.txt"],
              "browserTag": "chrome",
              "sessionTag": "s1",
              "timestampTag": "2019-08-01T10:00:00",
              "taskGroupName": "Group A",
              "keyLabel": "ParticipantID",
              "propertyRowOffsets": {{ "task_1": 0, "task_2": 0 }}
            }}
          ]
        }}
        "#,
        study_id
    )
}

fn write_fixture(root: &Path, study_id: &str, data_file: &str) {
    fs::write(root.join("study-manifest.json"), manifest_json(study_id))
        .expect("manifest should be written");
    fs::write(root.join("study-schemas.json"), SCHEMAS).expect("schemas should be written");
    fs::create_dir_all(root.join("data")).expect("data dir should be created");
    fs::write(root.join("data/chrome-a.txt"), data_file).expect("data file should be written");
}

fn run_import(root: &Path, extra_args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tabstudy"))
        .arg("import")
        .arg("--manifest")
        .arg(root.join("study-manifest.json"))
        .arg("--schemas")
        .arg(root.join("study-schemas.json"))
        .args(extra_args)
        .output()
        .expect("tabstudy binary should run")
}

#[test]
fn complete_import_prints_the_summary_and_writes_the_export() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(
        temp.path(),
        "usability-pilot",
        "ParticipantID\tP1\tP2\r\ntask_1\tYes\tMaybe\r\ntask_2\t5\t3\r\n",
    );

    let output = run_import(temp.path(), &[]);
    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Importing file 'chrome-a.txt' as chrome:Group A"));
    assert!(stdout.contains("1) P1 (Group A) -> checked:ok"));
    assert!(stdout.contains("2) P2 (Group A) -> checked:ok"));
    assert!(stdout.contains("Import status: COMPLETE"));
    assert!(stdout.contains("Export successful"));

    let export_path = temp.path().join("data/export.json");
    assert!(export_path.exists(), "export file should be created");
    let exported: Value = serde_json::from_str(
        &fs::read_to_string(&export_path).expect("export should be readable"),
    )
    .expect("export JSON should parse");
    assert_eq!(exported["P1"]["__browser"], "chrome");
    assert_eq!(exported["P1"]["__taskGroup"], "Group A");
    assert_eq!(exported["P1"]["__tasks"][1], 1);
    assert_eq!(exported["P1"]["__tasks"][2], 5);
    assert_eq!(exported["P2"]["__tasks"][1], 0);
}

#[test]
fn incomplete_import_suppresses_the_export_and_still_exits_zero() {
    let temp = TempDir::new().expect("tempdir should be created");
    // task_2 is missing entirely: both participants report a gap.
    write_fixture(
        temp.path(),
        "usability-pilot",
        "ParticipantID\tP1\tP2\r\ntask_1\tYes\tNo\r\n",
    );

    let output = run_import(temp.path(), &[]);
    assert!(
        output.status.success(),
        "suppressed export is not a process failure, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("checked:missing[2]"));
    assert!(stdout.contains("Import status: INCOMPLETE"));
    assert!(stdout.contains("Export suppressed"));
    assert!(!temp.path().join("data/export.json").exists());
}

#[test]
fn unknown_study_id_fails_fast_before_any_file_processing() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(
        temp.path(),
        "unknown-study",
        "ParticipantID\tP1\r\ntask_1\tYes\r\ntask_2\t5\r\n",
    );

    let output = run_import(temp.path(), &[]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("INPUT.STUDY_ID"));
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
    assert!(!temp.path().join("data/export.json").exists());
}

#[test]
fn report_flag_writes_a_machine_readable_run_report() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(
        temp.path(),
        "usability-pilot",
        "ParticipantID\tP1\r\ntask_1\tYes\r\ntask_2\t4\r\n",
    );

    let report_path = temp.path().join("reports/run.json");
    let output = run_import(
        temp.path(),
        &["--report", report_path.to_str().expect("path should be utf-8")],
    );
    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_str(
        &fs::read_to_string(&report_path).expect("report should be readable"),
    )
    .expect("report JSON should parse");
    assert_eq!(report["complete"], Value::Bool(true));
    assert_eq!(report["files"][0]["path"], "chrome-a.txt");
    assert_eq!(report["files"][0]["key_row_found"], Value::Bool(true));
}
