// SPDX-License-Identifier: Apache-2.0

// FlatFileStorage keeps every value in its own file. Files are
// spread over shard directories named after the first characters
// of the encoded key, so that no single directory grows too large:
//
//   <root>/<shard>/<name>.data
//
// `name` is the lowercase hex of the key bytes. Hex is injective and
// safe on case-insensitive filesystems, which base64 is not.

use super::traits::StorageEngine;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const DATA_SUFFIX: &str = ".data";
const TEMP_PREFIX: &str = ".tmp-";

#[derive(Debug)]
pub struct FlatFileStorage {
    root: PathBuf,
    shard_depth: usize,
    sync: bool,
}

impl FlatFileStorage {
    /// Opens (creating if needed) a flat-file store rooted at `root`.
    ///
    /// `shard_depth` is the number of leading name characters used as
    /// the shard directory; it must be at least 1. With `sync` every
    /// put is flushed to disk before it returns.
    pub fn new(root: PathBuf, shard_depth: usize, sync: bool) -> io::Result<Self> {
        if shard_depth == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "shard depth must be at least 1",
            ));
        }
        fs::create_dir_all(&root)?;
        if !fs::metadata(&root)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }
        debug!(
            "flat file storage at {} (shard depth {}, sync {})",
            root.display(),
            shard_depth,
            sync
        );
        Ok(Self {
            root,
            shard_depth,
            sync,
        })
    }

    /// Returns the shard directory and the data file for `key`.
    fn locate(&self, key: &str) -> io::Result<(PathBuf, PathBuf)> {
        if key.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty key is not allowed",
            ));
        }
        let name = encode_name(key);
        let shard = &name[..self.shard_depth.min(name.len())];
        let dir = self.root.join(shard);
        let file = dir.join(format!("{}{}", name, DATA_SUFFIX));
        Ok((dir, file))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(())
    }
}

impl StorageEngine for FlatFileStorage {
    fn put(&mut self, key: &str, data: &[u8]) -> io::Result<()> {
        let (dir, path) = self.locate(key)?;

        let created = match fs::create_dir(&dir) {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => false,
            Err(err) => return Err(err),
        };
        if created && self.sync {
            sync_dir(&self.root)?;
        }

        // readers never see a half written value
        let tmp = dir.join(format!("{}{}", TEMP_PREFIX, Uuid::new_v4()));
        if let Err(err) = self
            .write_file(&tmp, data)
            .and_then(|_| fs::rename(&tmp, &path))
        {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }

        if self.sync {
            sync_dir(&dir)?;
        }
        Ok(())
    }

    fn get(&self, key: &str) -> io::Result<Option<Arc<[u8]>>> {
        let (_, path) = self.locate(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(Arc::from(data))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn has(&self, key: &str) -> io::Result<bool> {
        let (_, path) = self.locate(key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn delete(&mut self, key: &str) -> io::Result<()> {
        let (dir, path) = self.locate(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Key '{}' not found", key),
                ))
            }
            Err(err) => return Err(err),
        }
        if self.sync {
            sync_dir(&dir)?;
        }
        Ok(())
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        let mut keys = Vec::new();
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                let file_name = entry.file_name();
                let Some(name) = file_name
                    .to_str()
                    .and_then(|n| n.strip_suffix(DATA_SUFFIX))
                else {
                    continue;
                };
                match decode_name(name) {
                    Some(key) => keys.push(key),
                    None => debug!("skipping foreign file {}", entry.path().display()),
                }
            }
        }
        Ok(keys)
    }
}

fn encode_name(key: &str) -> String {
    hex::encode(key)
}

fn decode_name(name: &str) -> Option<String> {
    hex::decode(name).ok().and_then(|b| String::from_utf8(b).ok())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

// directories cannot be opened for fsync outside of unix
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
