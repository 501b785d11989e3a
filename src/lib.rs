// SPDX-License-Identifier: Apache-2.0

//! Write throughput harness for key-value storage backends.
//!
//! A run generates random keys and blocks ([`datagen`]), opens a
//! backend ([`registry`]) in a disposable directory ([`workspace`])
//! and times sequential puts ([`driver`]). [`suite`] holds the matrix
//! of backend variants measured by the runner binary and the
//! criterion bench.

pub mod config;
pub mod datagen;
pub mod driver;
pub mod errors;
pub mod registry;
pub mod storage;
pub mod suite;
pub mod workspace;

pub use config::BackendOptions;
pub use datagen::{DataSet, DEFAULT_BLOCK_SIZE};
pub use driver::{run, Report, RunOutcome, SkipReason, OP_COUNT_CEILING};
pub use errors::BenchError;
pub use registry::{construct, Backend, BackendKind};
pub use storage::traits::StorageEngine;
pub use workspace::Workspace;

/// Installs the `tracing` subscriber used by the binary and the bench.
///
/// Logs go to stderr through a non-blocking writer; keep the returned
/// guard alive until exit or buffered lines are lost. `RUST_LOG`
/// overrides the default `info` level.
pub fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // a second call (another bench group, a test) keeps the first one
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer))
        .try_init();
    guard
}
