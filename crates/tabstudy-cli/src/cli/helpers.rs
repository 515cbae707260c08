use super::CliError;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabstudy_core::{
    CompletenessReport, FileImportReport, ImportManifest, ImportOutcome,
};

pub(super) fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// An explicit `--data-root` wins; otherwise the manifest's `dataRoot`
/// resolves relative to the manifest file, falling back to the manifest's
/// own directory.
pub(super) fn resolve_data_root(
    explicit: Option<&Path>,
    manifest_path: &Path,
    manifest: &ImportManifest,
) -> PathBuf {
    if let Some(root) = explicit {
        return root.to_path_buf();
    }

    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    match &manifest.data_root {
        Some(root) => base.join(root),
        None => base.to_path_buf(),
    }
}

/// The data root is run configuration, not data: an inaccessible root is a
/// setup error surfaced before any per-file recovery kicks in.
pub(super) fn ensure_data_root(data_root: &Path) -> Result<(), CliError> {
    let metadata = fs::metadata(data_root)
        .with_context(|| format!("data root '{}' is not accessible", data_root.display()))?;
    if !metadata.is_dir() {
        return Err(CliError::Usage(format!(
            "data root '{}' is not a directory",
            data_root.display()
        )));
    }
    Ok(())
}

/// Machine-readable run report written next to the human summary when
/// `--report` is given.
#[derive(Debug, Serialize)]
pub(super) struct ImportRunReport<'a> {
    pub(super) complete: bool,
    pub(super) files: &'a [FileImportReport],
    pub(super) completeness: &'a CompletenessReport,
}

impl<'a> ImportRunReport<'a> {
    pub(super) fn from_outcome(outcome: &'a ImportOutcome) -> Self {
        Self {
            complete: outcome.completeness.complete,
            files: &outcome.files,
            completeness: &outcome.completeness,
        }
    }
}

pub(super) fn write_run_report(path: &Path, report: &ImportRunReport<'_>) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create report directory '{}'", parent.display())
            })?;
        }
    }
    let payload = serde_json::to_string_pretty(report)
        .context("failed to serialize the import run report")?;
    fs::write(path, payload)
        .with_context(|| format!("failed to write report '{}'", path.display()))?;
    Ok(())
}
