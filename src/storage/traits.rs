// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

pub trait StorageEngine {
    fn put(&mut self, key: &str, data: &[u8]) -> std::io::Result<()>;
    fn get(&self, key: &str) -> std::io::Result<Option<Arc<[u8]>>>;
    fn has(&self, key: &str) -> std::io::Result<bool> {
        Ok(self.get(key)?.is_some())
    }
    fn delete(&mut self, key: &str) -> std::io::Result<()>;
    // used by tests and the runner to check that nothing
    // was dropped on the way to the backend
    fn keys(&self) -> std::io::Result<Vec<String>>;
}
