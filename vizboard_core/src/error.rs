// vizboard_core/src/error.rs

use thiserror::Error;

/// Errors raised while decoding or validating inbound payloads.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown message type '{0}'")]
    UnknownMessageType(String),

    #[error("failed to decode {message_type} payload: {source}")]
    Decode {
        message_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("occupancy grid declares {width}x{height} cells but carries {cells}")]
    GridSizeMismatch { width: u32, height: u32, cells: usize },
}
