//! Error types for winner encodings.

use thiserror::Error;

/// Errors that can occur while packing or unpacking winner indices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Invalid encoding length {len}: not a multiple of {width}")]
    InvalidLength { len: usize, width: usize },

    #[error("Index {index} exceeds width maximum {max}")]
    IndexTooLarge { index: u32, max: u32 },
}
