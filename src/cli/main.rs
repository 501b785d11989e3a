// SPDX-License-Identifier: Apache-2.0

use std::process::ExitCode;

use clap::Parser;

use dsbench::config::{BackendOptions, DEFAULT_SHARD_DEPTH, PG_URL_ENV};
use dsbench::datagen::{DataSet, DEFAULT_BLOCK_SIZE};
use dsbench::driver::{Report, RunOutcome};
use dsbench::suite;

const DEFAULT_OP_COUNT: usize = 1000;

/// Measure sequential put throughput of key-value storage backends.
///
/// Without --backend or --all only the in-memory variant runs.
#[derive(Parser, Debug)]
#[command(name = "dsbench", version)]
struct Args {
    /// Run variants whose name contains this substring (repeatable)
    #[arg(short, long = "backend", value_name = "FILTER")]
    backends: Vec<String>,

    /// Run every variant
    #[arg(long, conflicts_with = "backends")]
    all: bool,

    /// Number of puts per variant
    #[arg(short = 'n', long, default_value_t = DEFAULT_OP_COUNT)]
    count: usize,

    /// Size of every written block in bytes
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Key characters used as shard directory by the flat file backend
    #[arg(long, default_value_t = DEFAULT_SHARD_DEPTH)]
    shard_depth: usize,

    /// Do not flush to disk on every put (tree and sql backends)
    #[arg(long)]
    no_sync: bool,

    /// PostgreSQL connection string for the sql backend
    #[arg(long, env = PG_URL_ENV, hide_env_values = true)]
    pg_url: Option<String>,

    /// Print variant names and exit
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = dsbench::init_tracing();

    let options = BackendOptions {
        sync: !args.no_sync,
        shard_depth: args.shard_depth,
        connection_string: args.pg_url.filter(|url| !url.trim().is_empty()),
    };
    let all = suite::variants(&options);

    if args.list {
        for variant in &all {
            println!("{}", variant.name);
        }
        return ExitCode::SUCCESS;
    }

    let selected = if args.all {
        all
    } else if args.backends.is_empty() {
        suite::select(all, &["memory".to_string()])
    } else {
        suite::select(all, &args.backends)
    };
    if selected.is_empty() {
        eprintln!("no variant matches {:?}, see --list", args.backends);
        return ExitCode::FAILURE;
    }

    let mut data = DataSet::new(args.block_size);
    let mut failed = 0;
    for (name, result) in suite::run_all(&selected, &mut data, args.count) {
        match result {
            Ok(RunOutcome::Completed(elapsed)) => {
                let report = Report {
                    name,
                    ops: args.count,
                    block_size: data.block_size(),
                    elapsed,
                };
                println!("{}", report);
            }
            Ok(RunOutcome::Skipped(reason)) => {
                println!("{}: skipped ({})", name, reason);
            }
            Err(err) => {
                println!("{}: failed ({})", name, err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
