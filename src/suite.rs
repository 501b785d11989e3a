// SPDX-License-Identifier: Apache-2.0

// The benchmark matrix: which backend, where its files live and
// whether it syncs. Each variant is measured on its own; one failing
// or skipped variant never affects the others.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::{BackendOptions, PG_URL_ENV};
use crate::datagen::DataSet;
use crate::driver::{self, Report, RunOutcome, SkipReason};
use crate::errors::BenchError;
use crate::registry::{self, Backend, BackendKind};
use crate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub name: String,
    pub kind: BackendKind,
    /// Put the workspace on a memory-resident filesystem. Only
    /// meaningful for disk-backed kinds.
    pub memory_backed: bool,
    /// Directory to create the workspace in, overriding the choice
    /// made by `memory_backed`.
    pub workspace_root: Option<PathBuf>,
    pub options: BackendOptions,
}

impl Variant {
    fn new(kind: BackendKind, suffix: &str, memory_backed: bool, options: BackendOptions) -> Self {
        let name = if suffix.is_empty() {
            format!("{}_block_put", kind.name())
        } else {
            format!("{}_block_put_{}", kind.name(), suffix)
        };
        Self {
            name,
            kind,
            memory_backed,
            workspace_root: None,
            options,
        }
    }
}

/// Every benchmark variant, built on top of `base` options.
///
/// The flat file backend is measured with and without sync since that
/// is where it spends its time; the tree and SQL backends follow
/// `base.sync`.
pub fn variants(base: &BackendOptions) -> Vec<Variant> {
    let sync = base.clone().with_sync(true);
    let nosync = base.clone().with_sync(false);
    vec![
        Variant::new(BackendKind::Memory, "", false, base.clone()),
        Variant::new(BackendKind::FlatFile, "tmpfs", true, sync.clone()),
        Variant::new(BackendKind::FlatFile, "disk", false, sync),
        Variant::new(BackendKind::FlatFile, "tmpfs_nosync", true, nosync.clone()),
        Variant::new(BackendKind::FlatFile, "disk_nosync", false, nosync),
        Variant::new(BackendKind::Tree, "tmpfs", true, base.clone()),
        Variant::new(BackendKind::Tree, "disk", false, base.clone()),
        Variant::new(BackendKind::Sql, "", false, base.clone()),
    ]
}

/// Keeps the variants whose name contains any of `filters`, or all
/// of them when `filters` is empty.
pub fn select(variants: Vec<Variant>, filters: &[String]) -> Vec<Variant> {
    if filters.is_empty() {
        return variants;
    }
    variants
        .into_iter()
        .filter(|v| filters.iter().any(|f| v.name.contains(f.as_str())))
        .collect()
}

/// Runs one variant end to end: workspace, construction, timed puts,
/// teardown. The backend is closed before its workspace is removed.
pub fn run_variant(
    variant: &Variant,
    data: &mut DataSet,
    op_count: usize,
) -> Result<RunOutcome, BenchError> {
    if let Some(reason) = driver::check_ceiling(op_count) {
        warn!("skipping {}: {}", variant.name, reason);
        return Ok(RunOutcome::Skipped(reason));
    }

    let outcome = if variant.kind.is_disk_backed() {
        let workspace = match &variant.workspace_root {
            Some(base) => Workspace::acquire_in(base)?,
            None => Workspace::acquire(variant.memory_backed)?,
        };
        let outcome = {
            let mut backend =
                registry::construct(variant.kind, workspace.path(), &variant.options)?;
            driver::run(&mut backend, data, op_count)?
        };
        workspace.release()?;
        outcome
    } else {
        let mut backend = match variant.kind {
            BackendKind::Sql => match open_sql(variant)? {
                Ok(backend) => backend,
                Err(reason) => return Ok(RunOutcome::Skipped(reason)),
            },
            _ => registry::construct(variant.kind, Path::new(""), &variant.options)?,
        };
        driver::run(&mut backend, data, op_count)?
    };

    if let RunOutcome::Completed(elapsed) = outcome {
        let report = Report {
            name: variant.name.clone(),
            ops: op_count,
            block_size: data.block_size(),
            elapsed,
        };
        info!("{}", report);
    }
    Ok(outcome)
}

/// Runs every variant in order. A failing variant is logged and
/// recorded; the remaining ones still run.
pub fn run_all(
    variants: &[Variant],
    data: &mut DataSet,
    op_count: usize,
) -> Vec<(String, Result<RunOutcome, BenchError>)> {
    variants
        .iter()
        .map(|variant| {
            let result = run_variant(variant, data, op_count);
            if let Err(err) = &result {
                error!("{} failed: {}", variant.name, err);
            }
            (variant.name.clone(), result)
        })
        .collect()
}

/// Connects and empties the table. A missing or unusable database is
/// not an error for the suite: it is reported and the variant skipped.
fn open_sql(variant: &Variant) -> Result<Result<Backend, SkipReason>, BenchError> {
    if variant.options.connection_string.is_none() {
        warn!(
            "skipping {}: {} is not set, make sure you set up your postgresql database",
            variant.name, PG_URL_ENV
        );
        return Ok(Err(SkipReason::NoDatabase(format!(
            "set {} to run {}",
            PG_URL_ENV, variant.name
        ))));
    }
    let mut backend = match registry::construct(variant.kind, Path::new(""), &variant.options) {
        Ok(backend) => backend,
        Err(err) => {
            warn!("skipping {}: {}", variant.name, err);
            return Ok(Err(SkipReason::NoDatabase(err.to_string())));
        }
    };
    if let Backend::Sql(sql) = &mut backend {
        sql.clear().map_err(|source| BenchError::Construction {
            kind: BackendKind::Sql,
            location: "sql database".to_string(),
            source,
        })?;
    }
    Ok(Ok(backend))
}
