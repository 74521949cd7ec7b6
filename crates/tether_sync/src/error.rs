//! Wire-layer error types.

/// Errors from envelope encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Failed to encode an envelope to MessagePack.
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode an envelope from MessagePack.
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}
