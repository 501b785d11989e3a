// SPDX-License-Identifier: Apache-2.0

// The driver times N sequential puts against one store. Everything
// that is not a put (generation, construction, teardown) happens
// outside the timed region. Puts are issued one at a time from the
// calling thread, so the number reflects single-writer latency and
// nothing else.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, warn};

use crate::datagen::DataSet;
use crate::errors::BenchError;
use crate::storage::traits::StorageEngine;

/// Runs asking for more puts than this are skipped, not executed.
pub const OP_COUNT_CEILING: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    OpCountCeiling { requested: usize, ceiling: usize },
    NoDatabase(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OpCountCeiling { requested, ceiling } => write!(
                f,
                "{} operations requested, ceiling is {}",
                requested, ceiling
            ),
            SkipReason::NoDatabase(s) => write!(f, "no database available: {}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(Duration),
    Skipped(SkipReason),
}

impl RunOutcome {
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            RunOutcome::Completed(elapsed) => Some(*elapsed),
            RunOutcome::Skipped(_) => None,
        }
    }
}

/// Returns the skip reason when `op_count` is over the ceiling.
pub fn check_ceiling(op_count: usize) -> Option<SkipReason> {
    (op_count > OP_COUNT_CEILING).then_some(SkipReason::OpCountCeiling {
        requested: op_count,
        ceiling: OP_COUNT_CEILING,
    })
}

/// Puts the first `op_count` pairs of `data` into `store`, in order,
/// and returns how long the puts took.
///
/// `data` is grown first if it is too small. The first failing put
/// aborts the run; no further puts are issued.
pub fn run<S: StorageEngine>(
    store: &mut S,
    data: &mut DataSet,
    op_count: usize,
) -> Result<RunOutcome, BenchError> {
    if let Some(reason) = check_ceiling(op_count) {
        warn!("skipping run: {}", reason);
        return Ok(RunOutcome::Skipped(reason));
    }

    data.ensure(op_count);
    let pairs = data.keys().iter().zip(data.blocks()).take(op_count);

    let start = Instant::now();
    for (index, (key, block)) in pairs.enumerate() {
        if let Err(source) = store.put(key, block) {
            error!("put #{} of {} failed: {}", index, op_count, source);
            return Err(BenchError::Write {
                index,
                key: key.clone(),
                source,
            });
        }
    }
    Ok(RunOutcome::Completed(start.elapsed()))
}

/// Human readable result of one completed run.
#[derive(Debug, Clone)]
pub struct Report {
    pub name: String,
    pub ops: usize,
    pub block_size: usize,
    pub elapsed: Duration,
}

impl Report {
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.ops as f64 / secs
    }

    pub fn mib_per_sec(&self) -> f64 {
        self.ops_per_sec() * self.block_size as f64 / (1024.0 * 1024.0)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} puts of {} bytes in {:.2?} ({:.0} ops/s, {:.2} MiB/s)",
            self.name,
            self.ops,
            self.block_size,
            self.elapsed,
            self.ops_per_sec(),
            self.mib_per_sec()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_storage::MemoryStorage;
    use std::io;
    use std::sync::Arc;

    /// Counts puts and fails the one at `fail_at`.
    #[derive(Default)]
    struct CountingStore {
        puts: usize,
        fail_at: Option<usize>,
    }

    impl StorageEngine for CountingStore {
        fn put(&mut self, _key: &str, _data: &[u8]) -> io::Result<()> {
            if self.fail_at == Some(self.puts) {
                return Err(io::Error::new(io::ErrorKind::Other, "injected failure"));
            }
            self.puts += 1;
            Ok(())
        }

        fn get(&self, _key: &str) -> io::Result<Option<Arc<[u8]>>> {
            Ok(None)
        }

        fn delete(&mut self, _key: &str) -> io::Result<()> {
            Ok(())
        }

        fn keys(&self) -> io::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_ceiling_skips_without_puts() {
        let mut store = CountingStore::default();
        let mut data = DataSet::new(8);

        let outcome = run(&mut store, &mut data, OP_COUNT_CEILING + 1).unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Skipped(SkipReason::OpCountCeiling {
                requested: 100_001,
                ceiling: 100_000
            })
        );
        assert_eq!(store.puts, 0);
        // nothing generated for a skipped run either
        assert!(data.is_empty());
    }

    #[test]
    fn test_ceiling_itself_is_allowed() {
        assert!(check_ceiling(OP_COUNT_CEILING).is_none());
        assert!(check_ceiling(OP_COUNT_CEILING + 1).is_some());
    }

    #[test]
    fn test_issues_exactly_op_count_puts() {
        let mut store = CountingStore::default();
        let mut data = DataSet::new(8);
        data.ensure(100);

        let outcome = run(&mut store, &mut data, 40).unwrap();
        assert!(outcome.elapsed().is_some());
        assert_eq!(store.puts, 40);
        assert_eq!(data.len(), 100);
    }

    #[test]
    fn test_grows_data_before_timing() {
        let mut store = MemoryStorage::new();
        let mut data = DataSet::new(16);

        run(&mut store, &mut data, 25).unwrap();
        assert_eq!(data.len(), 25);
        for key in data.keys() {
            assert!(store.has(key).unwrap());
        }
    }

    #[test]
    fn test_stops_at_first_failure() {
        let mut store = CountingStore {
            puts: 0,
            fail_at: Some(5),
        };
        let mut data = DataSet::new(8);

        let err = run(&mut store, &mut data, 10).unwrap_err();
        match err {
            BenchError::Write { index, key, .. } => {
                assert_eq!(index, 5);
                assert_eq!(key, data.keys()[5]);
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(store.puts, 5);
    }

    #[test]
    fn test_zero_ops() {
        let mut store = CountingStore::default();
        let mut data = DataSet::new(8);

        let outcome = run(&mut store, &mut data, 0).unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert_eq!(store.puts, 0);
    }

    #[test]
    fn test_report() {
        let report = Report {
            name: "memory_block_put".to_string(),
            ops: 1000,
            block_size: 1024 * 1024,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(report.ops_per_sec(), 500.0);
        assert_eq!(report.mib_per_sec(), 500.0);
        assert!(report.to_string().starts_with("memory_block_put: 1000 puts"));

        let instant = Report {
            elapsed: Duration::ZERO,
            ..report
        };
        assert_eq!(instant.ops_per_sec(), 0.0);
    }
}
