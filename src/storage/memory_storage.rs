// SPDX-License-Identifier: Apache-2.0

use super::traits::StorageEngine;
use std::collections::HashMap;
use std::sync::Arc;

/// Plain in-process map. Measures the cost of copying a block into
/// the heap and hashing its key, with no I/O at all.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    storage: HashMap<String, Box<[u8]>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl StorageEngine for MemoryStorage {
    fn put(&mut self, key: &str, data: &[u8]) -> std::io::Result<()> {
        self.storage.insert(key.to_string(), data.into());
        Ok(())
    }

    fn get(&self, key: &str) -> std::io::Result<Option<Arc<[u8]>>> {
        Ok(self.storage.get(key).map(|data| Arc::from(data.as_ref())))
    }

    fn has(&self, key: &str) -> std::io::Result<bool> {
        Ok(self.storage.contains_key(key))
    }

    fn delete(&mut self, key: &str) -> std::io::Result<()> {
        match self.storage.remove(key) {
            Some(_) => Ok(()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Key '{}' not found", key),
            )),
        }
    }

    fn keys(&self) -> std::io::Result<Vec<String>> {
        Ok(self.storage.keys().cloned().collect())
    }
}
