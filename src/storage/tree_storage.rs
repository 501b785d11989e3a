// SPDX-License-Identifier: Apache-2.0

use super::traits::StorageEngine;
use redb::{Database, Durability, ReadableTable, TableDefinition};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("bench");
const DB_FILE: &str = "tree.redb";

/// Embedded copy-on-write B-tree backed by a single `redb` file.
///
/// Every put is its own write transaction, matching the one
/// transaction per key behaviour of bucket based tree stores.
pub struct TreeStorage {
    db: Database,
    file: PathBuf,
    sync: bool,
}

impl TreeStorage {
    /// Creates the database file inside `dir` and makes sure the
    /// `bench` table exists, so that readers never race its creation.
    pub fn new(dir: &Path, sync: bool) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = dir.join(DB_FILE);
        let db = Database::create(&file).map_err(to_io)?;

        let txn = db.begin_write().map_err(to_io)?;
        txn.open_table(TABLE).map_err(to_io)?;
        txn.commit().map_err(to_io)?;

        debug!("tree storage at {} (sync {})", file.display(), sync);
        Ok(Self { db, file, sync })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl std::fmt::Debug for TreeStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStorage")
            .field("file", &self.file)
            .field("sync", &self.sync)
            .finish()
    }
}

impl StorageEngine for TreeStorage {
    fn put(&mut self, key: &str, data: &[u8]) -> io::Result<()> {
        let mut txn = self.db.begin_write().map_err(to_io)?;
        if !self.sync {
            txn.set_durability(Durability::None);
        }
        {
            let mut table = txn.open_table(TABLE).map_err(to_io)?;
            table.insert(key, data).map_err(to_io)?;
        }
        txn.commit().map_err(to_io)
    }

    fn get(&self, key: &str) -> io::Result<Option<Arc<[u8]>>> {
        let txn = self.db.begin_read().map_err(to_io)?;
        let table = txn.open_table(TABLE).map_err(to_io)?;
        let value = table.get(key).map_err(to_io)?;
        Ok(value.map(|guard| Arc::from(guard.value())))
    }

    fn delete(&mut self, key: &str) -> io::Result<()> {
        let txn = self.db.begin_write().map_err(to_io)?;
        let removed = {
            let mut table = txn.open_table(TABLE).map_err(to_io)?;
            table
                .remove(key)
                .map(|guard| guard.is_some())
                .map_err(to_io)?
        };
        if !removed {
            // nothing changed, dropping the transaction aborts it
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Key '{}' not found", key),
            ));
        }
        txn.commit().map_err(to_io)
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        let txn = self.db.begin_read().map_err(to_io)?;
        let table = txn.open_table(TABLE).map_err(to_io)?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(to_io)? {
            let (key, _) = entry.map_err(to_io)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

fn to_io<E: Into<redb::Error>>(err: E) -> io::Error {
    match err.into() {
        redb::Error::Io(err) => err,
        other => io::Error::other(other.to_string()),
    }
}
