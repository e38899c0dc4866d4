use thiserror::Error;

use crate::config::Role;

/// Fatal protocol errors. Anything recoverable (corrupted blocks, late
/// arrivals, duplicate acks) is absorbed where it is detected and never
/// reaches this type.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{role} node received unexpected {kind}")]
    UnexpectedMessage { role: Role, kind: &'static str },

    #[error("egress gate has {available} path(s), redundancy mode needs {required}")]
    InsufficientPaths { required: usize, available: usize },
}

/// Configuration parse and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),

    #[error("k must be greater than zero")]
    InvalidK,

    #[error("duplication mode does not use parity blocks (m = {0})")]
    ParityInDuplication(u32),

    #[error("block size must be greater than zero")]
    InvalidBlockSize,
}
