// SPDX-License-Identifier: Apache-2.0

// DataSet holds the random keys and blocks a benchmark writes.
// Generating 256 KiB blocks is slow compared to some backends, so it
// happens before the clock starts and is amortized: when a benchmark
// is repeated with a growing op count, only the shortfall is produced.

use base64::Engine;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;
use tracing::debug;

/// Raw random bytes behind every key.
pub const KEY_LEN: usize = 32;

/// A quarter MiB plus a few bytes, so that blocks never line up with
/// page or sector boundaries.
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024 + 7;

pub struct DataSet {
    rng: SmallRng,
    block_size: usize,
    keys: Vec<String>,
    blocks: Vec<Box<[u8]>>,
    seen: HashSet<[u8; KEY_LEN]>,
}

impl DataSet {
    pub fn new(block_size: usize) -> Self {
        Self::with_rng(block_size, SmallRng::from_os_rng())
    }

    /// Reproducible data set, for tests and for comparing runs.
    pub fn with_seed(block_size: usize, seed: u64) -> Self {
        Self::with_rng(block_size, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(block_size: usize, rng: SmallRng) -> Self {
        Self {
            rng,
            block_size,
            keys: Vec::new(),
            blocks: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Grows the data set to at least `count` pairs. Never shrinks it.
    ///
    /// Keys are unique: a raw key that was already drawn is thrown
    /// away and drawn again, so no put in a run overwrites another.
    pub fn ensure(&mut self, count: usize) {
        if self.keys.len() >= count {
            return;
        }
        let missing = count - self.keys.len();
        debug!(
            "generating {} blocks of {} bytes",
            missing, self.block_size
        );
        self.keys.reserve(missing);
        self.blocks.reserve(missing);

        let engine = base64::engine::general_purpose::STANDARD;
        while self.keys.len() < count {
            let mut raw = [0u8; KEY_LEN];
            self.rng.fill_bytes(&mut raw);
            if !self.seen.insert(raw) {
                debug!("random key collision, drawing again");
                continue;
            }
            let mut block = vec![0u8; self.block_size].into_boxed_slice();
            self.rng.fill_bytes(&mut block);

            self.keys.push(engine.encode(raw));
            self.blocks.push(block);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn blocks(&self) -> &[Box<[u8]>] {
        &self.blocks
    }

    pub fn pair(&self, index: usize) -> Option<(&str, &[u8])> {
        Some((self.keys.get(index)?.as_str(), self.blocks.get(index)?.as_ref()))
    }
}

impl std::fmt::Debug for DataSet {
    // blocks are far too big to print
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSet")
            .field("block_size", &self.block_size)
            .field("len", &self.keys.len())
            .finish()
    }
}
