// SPDX-License-Identifier: Apache-2.0

// The registry turns a backend kind plus a location into an open
// store. Stores are kept in a tagged enum rather than behind a trait
// object: the set of backends is closed and the driver loop stays
// free of dynamic dispatch.

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::config::BackendOptions;
use crate::errors::BenchError;
use crate::storage::flat_file_storage::FlatFileStorage;
use crate::storage::memory_storage::MemoryStorage;
use crate::storage::sql_storage::SqlStorage;
use crate::storage::traits::StorageEngine;
use crate::storage::tree_storage::TreeStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Memory,
    FlatFile,
    Tree,
    Sql,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Memory,
        BackendKind::FlatFile,
        BackendKind::Tree,
        BackendKind::Sql,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::FlatFile => "flat_file",
            BackendKind::Tree => "tree",
            BackendKind::Sql => "sql",
        }
    }

    /// Whether the backend keeps its state in a directory and so needs
    /// a workspace.
    pub fn is_disk_backed(&self) -> bool {
        matches!(self, BackendKind::FlatFile | BackendKind::Tree)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "map" => Ok(BackendKind::Memory),
            "flat_file" | "flatfile" | "flatfs" => Ok(BackendKind::FlatFile),
            "tree" | "bolt" | "redb" => Ok(BackendKind::Tree),
            "sql" | "postgres" => Ok(BackendKind::Sql),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

#[derive(Debug)]
pub enum Backend {
    Memory(MemoryStorage),
    FlatFile(FlatFileStorage),
    Tree(TreeStorage),
    Sql(SqlStorage),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Memory(_) => BackendKind::Memory,
            Backend::FlatFile(_) => BackendKind::FlatFile,
            Backend::Tree(_) => BackendKind::Tree,
            Backend::Sql(_) => BackendKind::Sql,
        }
    }
}

/// Opens a `kind` store at `path`. Only constructs; nothing is written
/// beyond the backend's own empty schema.
///
/// `path` is ignored by the memory and SQL backends. The SQL backend
/// takes its location from `options.connection_string` instead.
pub fn construct(
    kind: BackendKind,
    path: &Path,
    options: &BackendOptions,
) -> Result<Backend, BenchError> {
    debug!("constructing {} backend", kind);
    let location = match kind {
        BackendKind::Memory => "memory".to_string(),
        // never log or report credentials
        BackendKind::Sql => "sql database".to_string(),
        _ => path.display().to_string(),
    };
    let result = match kind {
        BackendKind::Memory => Ok(Backend::Memory(MemoryStorage::new())),
        BackendKind::FlatFile => {
            FlatFileStorage::new(path.to_path_buf(), options.shard_depth, options.sync)
                .map(Backend::FlatFile)
        }
        BackendKind::Tree => TreeStorage::new(path, options.sync).map(Backend::Tree),
        BackendKind::Sql => match options.connection_string.as_deref() {
            Some(url) => SqlStorage::new(url, options.sync).map(Backend::Sql),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no connection string configured",
            )),
        },
    };
    result.map_err(|source| BenchError::Construction {
        kind,
        location,
        source,
    })
}

impl StorageEngine for Backend {
    fn put(&mut self, key: &str, data: &[u8]) -> io::Result<()> {
        match self {
            Backend::Memory(s) => s.put(key, data),
            Backend::FlatFile(s) => s.put(key, data),
            Backend::Tree(s) => s.put(key, data),
            Backend::Sql(s) => s.put(key, data),
        }
    }

    fn get(&self, key: &str) -> io::Result<Option<Arc<[u8]>>> {
        match self {
            Backend::Memory(s) => s.get(key),
            Backend::FlatFile(s) => s.get(key),
            Backend::Tree(s) => s.get(key),
            Backend::Sql(s) => s.get(key),
        }
    }

    fn has(&self, key: &str) -> io::Result<bool> {
        match self {
            Backend::Memory(s) => s.has(key),
            Backend::FlatFile(s) => s.has(key),
            Backend::Tree(s) => s.has(key),
            Backend::Sql(s) => s.has(key),
        }
    }

    fn delete(&mut self, key: &str) -> io::Result<()> {
        match self {
            Backend::Memory(s) => s.delete(key),
            Backend::FlatFile(s) => s.delete(key),
            Backend::Tree(s) => s.delete(key),
            Backend::Sql(s) => s.delete(key),
        }
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        match self {
            Backend::Memory(s) => s.keys(),
            Backend::FlatFile(s) => s.keys(),
            Backend::Tree(s) => s.keys(),
            Backend::Sql(s) => s.keys(),
        }
    }
}
