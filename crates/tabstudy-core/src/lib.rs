//! Importer for tab-delimited study export files.
//!
//! Raw file text flows through row splitting ([`rows`]), per-file mapping
//! ([`mapper`] over [`normalize`]), study-wide merging ([`merge`]), and the
//! completeness gate ([`check`]); [`runner`] drives the whole pipeline from
//! a manifest of data source descriptors.

pub mod check;
pub mod domain;
pub mod mapper;
pub mod merge;
pub mod normalize;
pub mod rows;
pub mod runner;
pub mod tables;

pub use check::{
    CheckStatus, CompletenessReport, ParticipantCheck, check_completeness,
    render_completeness_summary,
};
pub use domain::{
    CellValue, ClipReference, DataSourceDescriptor, FileDataMap, FileRecord, Group, ImportError,
    ImportErrorCategory, ImportResult, ParticipantId, ParticipantRecord, ResponseType,
    SchemaCatalog, StudyMap, StudySchema, Task,
};
pub use mapper::{FileMapOutcome, RowMapperRequest, map_file_rows};
pub use merge::ImportContext;
pub use normalize::{NormalizedResponse, ResponseNormalizer, WordMatchNote};
pub use rows::{EolMarker, KeyRow, RowSplitOutcome, resolve_key_row, split_rows};
pub use runner::{
    FileImportReport, ImportConfig, ImportManifest, ImportOutcome, load_manifest,
    load_response_tables, load_schema_catalog, render_import_summary, run_import,
    write_export_file,
};
pub use tables::ResponseTables;
