// SPDX-License-Identifier: Apache-2.0

/// Environment variable holding the PostgreSQL connection string.
/// Credentials stay out of the command line and the source tree.
pub const PG_URL_ENV: &str = "DSBENCH_PG_URL";

pub const DEFAULT_SHARD_DEPTH: usize = 2;

/// Options handed to every backend constructor. A backend ignores
/// the ones it has no use for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    /// Flush to stable storage before a put returns.
    pub sync: bool,
    /// Number of key characters used as shard directory by the
    /// flat file backend.
    pub shard_depth: usize,
    /// Connection string for the SQL backend.
    pub connection_string: Option<String>,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            sync: true,
            shard_depth: DEFAULT_SHARD_DEPTH,
            connection_string: None,
        }
    }
}

impl BackendOptions {
    /// Defaults, with the connection string taken from `DSBENCH_PG_URL`
    /// when it is set and not blank.
    pub fn from_env() -> Self {
        Self {
            connection_string: std::env::var(PG_URL_ENV)
                .ok()
                .filter(|url| !url.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}
