use super::CliError;
use super::helpers::{
    ensure_data_root, init_tracing, resolve_data_root, write_run_report, ImportRunReport,
};
use std::path::PathBuf;
use tabstudy_core::{
    ImportConfig, ImportError, ResponseTables, load_manifest, load_response_tables,
    load_schema_catalog, render_import_summary, run_import, write_export_file,
};
use tracing::debug;

#[derive(clap::Args)]
pub(super) struct ImportArgs {
    /// Import manifest path
    #[arg(long, default_value = "study-manifest.json")]
    manifest: PathBuf,

    /// Schema catalog path
    #[arg(long, default_value = "study-schemas.json")]
    schemas: PathBuf,

    /// Response table overrides path (compiled-in defaults otherwise)
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Data root directory, overriding the manifest's
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Export file name written under the data root
    #[arg(long, default_value = "export.json")]
    export_name: String,

    /// JSON run-report output path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print word-match summaries and debug-level diagnostics
    #[arg(long, short)]
    verbose: bool,
}

pub(super) fn run_import_command(args: ImportArgs) -> Result<i32, CliError> {
    init_tracing(args.verbose);

    let manifest = load_manifest(&args.manifest).map_err(CliError::Import)?;
    debug!(manifest = %args.manifest.display(), study = %manifest.study_id, "loaded import manifest");

    let catalog = load_schema_catalog(&args.schemas).map_err(CliError::Import)?;
    let schema = catalog.find_study(&manifest.study_id).ok_or_else(|| {
        CliError::Import(ImportError::input_validation(
            "INPUT.STUDY_ID",
            format!(
                "no schema in '{}' for study '{}'",
                args.schemas.display(),
                manifest.study_id
            ),
        ))
    })?;

    let tables = match &args.tables {
        Some(path) => load_response_tables(path).map_err(CliError::Import)?,
        None => ResponseTables::default(),
    };

    let data_root = resolve_data_root(args.data_root.as_deref(), &args.manifest, &manifest);
    ensure_data_root(&data_root)?;

    let config = ImportConfig {
        data_root: data_root.clone(),
        sources: manifest.sources,
    };
    let outcome = run_import(&config, schema, &tables).map_err(CliError::Import)?;

    println!("{}", render_import_summary(&outcome, args.verbose));

    if let Some(report_path) = &args.report {
        write_run_report(report_path, &ImportRunReport::from_outcome(&outcome))?;
        println!("JSON report: {}", report_path.display());
    }

    if outcome.completeness.complete {
        let export_path = data_root.join(&args.export_name);
        write_export_file(&export_path, &outcome.study_map).map_err(CliError::Import)?;
        println!("Export successful: {}", export_path.display());
    } else {
        println!("Export suppressed: incomplete participant data.");
    }

    Ok(0)
}
