// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::registry::BackendKind;

#[derive(Debug, Error)]
pub enum BenchError {
    /// The backend could not be opened. Fatal for that variant only.
    #[error("failed to open {kind} backend at {location}: {source}")]
    Construction {
        kind: BackendKind,
        location: String,
        #[source]
        source: io::Error,
    },
    /// A put failed during the timed loop. The run is aborted.
    #[error("put #{index} ({key}) failed: {source}")]
    Write {
        index: usize,
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("workspace {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BenchError {
    pub fn is_construction(&self) -> bool {
        matches!(self, BenchError::Construction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_write_error_keeps_source() {
        let err = BenchError::Write {
            index: 3,
            key: "abc".to_string(),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        };
        assert_eq!(err.to_string(), "put #3 (abc) failed: disk full");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
        assert!(!err.is_construction());
    }

    #[test]
    fn test_construction_display() {
        let err = BenchError::Construction {
            kind: BackendKind::Tree,
            location: "/tmp/x".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "failed to open tree backend at /tmp/x: denied"
        );
        assert!(err.is_construction());
    }
}
