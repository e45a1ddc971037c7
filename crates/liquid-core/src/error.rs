use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the Liquid Engine dispatcher core.
#[derive(Debug, Error)]
pub enum LiquidError {
    #[error("backend '{backend}' is not available on this engine")]
    BackendUnavailable { backend: &'static str },

    #[error("no enabled backend has an implementation for this operation")]
    NoBackendImplemented,

    #[error("failed to persist run-time statistics to {path}: {source}")]
    ConfigIOError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not find GPU kernel source at {resolved_path}")]
    KernelSourceMissing { resolved_path: PathBuf },

    #[error("backend invocation failed: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LiquidError>;
