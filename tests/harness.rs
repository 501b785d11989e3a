// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use tempfile::TempDir;

use dsbench::config::BackendOptions;
use dsbench::datagen::{DataSet, DEFAULT_BLOCK_SIZE};
use dsbench::driver::{self, RunOutcome, SkipReason, OP_COUNT_CEILING};
use dsbench::errors::BenchError;
use dsbench::registry::{self, BackendKind};
use dsbench::storage::traits::StorageEngine;
use dsbench::suite;
use dsbench::workspace::{Workspace, WORKSPACE_PREFIX};

fn put_all_then_check(kind: BackendKind, options: &BackendOptions) -> Result<()> {
    let ws = Workspace::acquire(true)?;
    let mut data = DataSet::new(1024);

    {
        let mut backend = registry::construct(kind, ws.path(), options)?;
        assert!(backend.keys()?.is_empty());

        let outcome = driver::run(&mut backend, &mut data, 200)?;
        assert!(outcome.elapsed().is_some());

        for (key, block) in data.keys().iter().zip(data.blocks()) {
            assert!(backend.has(key)?, "{} lost {}", kind, key);
            assert_eq!(backend.get(key)?.unwrap().as_ref(), block.as_ref());
        }
        assert_eq!(backend.keys()?.len(), 200);
    }

    ws.release()?;
    Ok(())
}

#[test]
fn test_memory_keeps_every_put() -> Result<()> {
    put_all_then_check(BackendKind::Memory, &BackendOptions::default())
}

#[test]
fn test_flat_file_keeps_every_put() -> Result<()> {
    put_all_then_check(BackendKind::FlatFile, &BackendOptions::default())?;
    put_all_then_check(BackendKind::FlatFile, &BackendOptions::default().with_sync(false))
}

#[test]
fn test_tree_keeps_every_put() -> Result<()> {
    put_all_then_check(BackendKind::Tree, &BackendOptions::default())?;
    put_all_then_check(BackendKind::Tree, &BackendOptions::default().with_sync(false))
}

#[test]
fn test_sql_keeps_every_put() -> Result<()> {
    let options = BackendOptions::from_env();
    if options.connection_string.is_none() {
        eprintln!("no database configured, skipping");
        return Ok(());
    }
    let variant = suite::variants(&options)
        .into_iter()
        .find(|v| v.kind == BackendKind::Sql)
        .unwrap();
    let mut data = DataSet::new(1024);

    let outcome = suite::run_variant(&variant, &mut data, 50)?;
    assert!(matches!(outcome, RunOutcome::Completed(_)));

    let backend = registry::construct(BackendKind::Sql, std::path::Path::new(""), &options)?;
    for key in &data.keys()[..50] {
        assert!(backend.has(key)?);
    }
    Ok(())
}

#[test]
fn test_memory_thousand_default_blocks() -> Result<()> {
    let variant = suite::variants(&BackendOptions::default())
        .into_iter()
        .find(|v| v.kind == BackendKind::Memory)
        .unwrap();
    let mut data = DataSet::new(256 * 1024);

    let outcome = suite::run_variant(&variant, &mut data, 1000)?;
    match outcome {
        RunOutcome::Completed(elapsed) => assert!(elapsed.as_nanos() > 0),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(data.len(), 1000);
    Ok(())
}

#[test]
fn test_every_local_variant_runs() -> Result<()> {
    let mut data = DataSet::new(DEFAULT_BLOCK_SIZE);
    let variants = suite::variants(&BackendOptions::default());

    for variant in variants.iter().filter(|v| v.kind != BackendKind::Sql) {
        let outcome = suite::run_variant(variant, &mut data, 20)?;
        assert!(
            matches!(outcome, RunOutcome::Completed(_)),
            "{} did not complete",
            variant.name
        );
    }
    Ok(())
}

#[test]
fn test_suite_ceiling_skips() -> Result<()> {
    let variant = suite::variants(&BackendOptions::default())
        .into_iter()
        .find(|v| v.name == "flat_file_block_put_tmpfs")
        .unwrap();
    let mut data = DataSet::new(DEFAULT_BLOCK_SIZE);

    let outcome = suite::run_variant(&variant, &mut data, OP_COUNT_CEILING + 1)?;
    assert_eq!(
        outcome,
        RunOutcome::Skipped(SkipReason::OpCountCeiling {
            requested: OP_COUNT_CEILING + 1,
            ceiling: OP_COUNT_CEILING,
        })
    );
    assert!(data.is_empty());
    Ok(())
}

#[test]
fn test_first_failure_aborts_run() -> Result<()> {
    let base = TempDir::new()?;
    let root = base.path().join("store");
    let mut backend =
        registry::construct(BackendKind::FlatFile, &root, &BackendOptions::default())?;
    // pull the directory out from under the store
    std::fs::remove_dir_all(&root)?;

    let mut data = DataSet::new(64);
    match driver::run(&mut backend, &mut data, 10) {
        Err(BenchError::Write { index, key, .. }) => {
            assert_eq!(index, 0);
            assert_eq!(key, data.keys()[0]);
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert!(!root.exists());
    Ok(())
}

#[test]
fn test_construction_failure_is_reported() -> Result<()> {
    let base = TempDir::new()?;
    let occupied = base.path().join("occupied");
    std::fs::write(&occupied, b"not a directory")?;

    let err = registry::construct(BackendKind::Tree, &occupied, &BackendOptions::default())
        .unwrap_err();
    assert!(err.is_construction());
    Ok(())
}

#[test]
fn test_failed_variant_does_not_stop_the_rest() -> Result<()> {
    let base = TempDir::new()?;
    let all = suite::variants(&BackendOptions::default());
    let mut broken = all
        .iter()
        .find(|v| v.name == "flat_file_block_put_disk")
        .cloned()
        .unwrap();
    broken.options.shard_depth = 0;
    broken.workspace_root = Some(base.path().to_path_buf());
    let mut healthy = all
        .iter()
        .find(|v| v.name == "tree_block_put_disk")
        .cloned()
        .unwrap();
    healthy.workspace_root = Some(base.path().to_path_buf());

    let mut data = DataSet::new(512);
    let results = suite::run_all(&[broken, healthy], &mut data, 10);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "flat_file_block_put_disk");
    assert!(matches!(
        results[0].1,
        Err(BenchError::Construction {
            kind: BackendKind::FlatFile,
            ..
        })
    ));
    assert_eq!(results[1].0, "tree_block_put_disk");
    assert!(matches!(results[1].1, Ok(RunOutcome::Completed(_))));

    // both workspaces are gone, including the one of the failed run
    let leftovers: Vec<_> = std::fs::read_dir(base.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(WORKSPACE_PREFIX))
        .collect();
    assert!(leftovers.is_empty(), "left behind {:?}", leftovers);
    Ok(())
}

#[test]
fn test_sql_connection_failure_reports_cause() -> Result<()> {
    let options = BackendOptions {
        connection_string: Some("host=/nonexistent/sock user=nobody".to_string()),
        ..BackendOptions::default()
    };
    let variant = suite::variants(&options)
        .into_iter()
        .find(|v| v.kind == BackendKind::Sql)
        .unwrap();
    let mut data = DataSet::new(64);

    match suite::run_variant(&variant, &mut data, 10)? {
        RunOutcome::Skipped(SkipReason::NoDatabase(reason)) => {
            assert!(!reason.contains("set DSBENCH_PG_URL"), "{}", reason);
            assert!(reason.contains("failed to open sql backend"), "{}", reason);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    Ok(())
}
