use std::time::Duration;

use thiserror::Error;
use tsn_transport::{ConfigError, PathId, TransportError};

use crate::topology::NodeId;

#[derive(Debug, Error)]
pub enum SimError {
    /// A message was handed to a channel that is still transmitting. The
    /// node's scheduler is supposed to make this impossible.
    #[error("{node} {path} busy until {busy_until:?}, transmission requested at {start:?}")]
    ChannelBusy {
        node: NodeId,
        path: PathId,
        start: Duration,
        busy_until: Duration,
    },

    #[error("{node} has no {path}")]
    UnknownPath { node: NodeId, path: PathId },

    #[error("node {node} failed: {source}")]
    Node {
        node: NodeId,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid link {index}: {reason}")]
    InvalidLink { index: usize, reason: String },

    #[error("talker and switch disagree on {field}")]
    NodeMismatch { field: &'static str },

    #[error("invalid time limit {0} s")]
    InvalidTimeLimit(f64),
}
