use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use roster_core::{
    ExecuteOptions, ExecutionBatch, KeyedIdentityCipher, MemoryStore, execute, validate,
};
use roster_ingest::read_table;
use roster_map::{MappingEngine, MappingState};
use roster_model::{ExecutionResult, SourceTable};
use roster_validate::ValidationOutcome;
use tracing::{debug, info, info_span};

use roster_cli::config::{FileConfig, Overrides, Settings};
use roster_cli::logging::redact_value;
use roster_cli::report::{execution_rows, validation_rows, write_report};

use crate::cli::{ImportArgs, MapArgs, SourceArgs, StoreArgs, ValidateArgs};

pub struct ValidationRun {
    pub mapping: MappingState,
    pub outcome: ValidationOutcome,
}

pub struct ImportRun {
    pub mapping: MappingState,
    pub outcome: ValidationOutcome,
    pub result: ExecutionResult,
}

pub fn run_map(config: Option<&Path>, args: &MapArgs) -> Result<MappingState> {
    let settings = load_settings(config, &args.source, None)?;
    let table = load_source(&args.source.file)?;
    map_columns(&settings, &table)
}

pub fn run_validate(config: Option<&Path>, args: &ValidateArgs) -> Result<ValidationRun> {
    let settings = load_settings(config, &args.source, Some(&args.store))?;
    let tenant = settings.require_tenant()?.clone();
    let cipher = open_cipher(&settings)?;
    let store = MemoryStore::open(&settings.store).context("open record store")?;

    let table = load_source(&args.source.file)?;
    let mapping = map_columns(&settings, &table)?;
    let outcome = validate(mapping.mappings(), &table, &store, &cipher, &tenant)?;
    log_error_rows(&outcome);

    if let Some(path) = &args.report {
        write_report(path, &validation_rows(&outcome))?;
        info!(path = %path.display(), "wrote validation report");
    }
    Ok(ValidationRun { mapping, outcome })
}

pub fn run_import(config: Option<&Path>, args: &ImportArgs) -> Result<ImportRun> {
    let settings = load_settings(config, &args.source, Some(&args.store))?;
    let tenant = settings.require_tenant()?.clone();
    let cipher = open_cipher(&settings)?;
    let mut store = MemoryStore::open(&settings.store).context("open record store")?;

    let table = load_source(&args.source.file)?;
    let mapping = map_columns(&settings, &table)?;
    let outcome = validate(mapping.mappings(), &table, &store, &cipher, &tenant)?;
    log_error_rows(&outcome);

    let mut options = ExecuteOptions::new(args.on_duplicate.into());
    if let Some(seconds) = args.timeout {
        options = options.with_deadline(Instant::now() + Duration::from_secs(seconds));
    }
    let batch = ExecutionBatch::from_outcome(outcome.clone());
    let result = execute(&mut store, &cipher, &tenant, &batch, options)?;
    store.save_json(&settings.store).context("save record store")?;

    if let Some(path) = &args.report {
        let mut rows = validation_rows(&outcome);
        rows.retain(|row| row.status == "error");
        rows.extend(execution_rows(&result));
        rows.sort_by_key(|row| row.row_index);
        write_report(path, &rows)?;
        info!(path = %path.display(), "wrote import report");
    }
    Ok(ImportRun {
        mapping,
        outcome,
        result,
    })
}

fn load_settings(
    config: Option<&Path>,
    source: &SourceArgs,
    store: Option<&StoreArgs>,
) -> Result<Settings> {
    let file = FileConfig::load(config)?;
    let overrides = Overrides {
        tenant: store.and_then(|s| s.tenant.clone()),
        store: store.and_then(|s| s.store.clone()),
        min_confidence: source.min_confidence,
        columns: source.columns.clone(),
    };
    Ok(Settings::resolve(file, overrides)?)
}

fn load_source(path: &Path) -> Result<SourceTable> {
    let span = info_span!("ingest", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();
    let table = read_table(path).with_context(|| format!("read {}", path.display()))?;
    info!(
        columns = table.headers.len(),
        rows = table.row_count(),
        duration_ms = start.elapsed().as_millis(),
        "ingest complete"
    );
    Ok(table)
}

fn map_columns(settings: &Settings, table: &SourceTable) -> Result<MappingState> {
    let span = info_span!("map", columns = table.headers.len());
    let _guard = span.enter();
    let engine = MappingEngine::new().with_min_confidence(settings.min_confidence);
    let mut state = MappingState::suggest(&engine, &table.headers);
    state
        .apply_overrides(&settings.columns)
        .context("apply column overrides")?;
    let summary = state.summary();
    info!(
        columns = summary.columns,
        mapped = summary.mapped,
        overridden = summary.overridden,
        required_mapped = summary.required_mapped,
        required_total = summary.required_total,
        "mapping complete"
    );
    Ok(state)
}

fn open_cipher(settings: &Settings) -> Result<KeyedIdentityCipher> {
    KeyedIdentityCipher::from_env(&settings.identity_key_env).context("load identity key")
}

fn log_error_rows(outcome: &ValidationOutcome) {
    for row in &outcome.error_rows {
        debug!(
            row = row.row_index,
            name = redact_value(row.display_name()),
            errors = %row.error_summary(),
            "row rejected"
        );
    }
}
