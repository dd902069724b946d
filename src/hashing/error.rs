use std::path::PathBuf;
use thiserror::Error;

/// Failure while fingerprinting a file
#[derive(Debug, Error)]
pub enum HashError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} ended early: expected {expected} bytes, read {actual}", path.display())]
    Truncated {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

impl HashError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            HashError::Open { path, .. }
            | HashError::Read { path, .. }
            | HashError::Truncated { path, .. } => path,
        }
    }
}
