use std::ffi::NulError;
use std::path::PathBuf;

use thiserror::Error;

use crate::lighting::LightKind;

#[derive(Debug, Error)]
pub enum LightingError {
    /// An incremental update ran before the first full upload created the buffer.
    #[error("{kind:?} light buffer updated before its first full upload")]
    BufferNotAllocated { kind: LightKind },
    /// Lights were registered after the last full upload; their slots lie
    /// past the end of the buffer.
    #[error("{kind:?} light buffer holds {capacity} records but {records} are registered")]
    StaleBuffer {
        kind: LightKind,
        records: usize,
        capacity: usize,
    },
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{stage} shader compile error: {log}")]
    Compile { stage: &'static str, log: String },
    #[error("shader link error: {0}")]
    Link(String),
    #[error("shader source contains an interior NUL byte")]
    Nul(#[from] NulError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid lighting config: {0}")]
    Invalid(String),
}
