//! Fixed-width packing of winner indices.
//!
//! Each index is written big-endian using exactly `IndexWidth::bytes()` bytes,
//! so an encoding of `n` indices is always `n * width` bytes long.

use candle_types::IndexWidth;

use crate::error::CodecError;

/// Pack indices into their fixed-width byte form.
pub fn encode(indices: &[u32], width: IndexWidth) -> Result<Vec<u8>, CodecError> {
    let size = width.bytes();
    let max = width.max_index();
    let mut out = Vec::with_capacity(indices.len() * size);

    for &index in indices {
        if index > max {
            return Err(CodecError::IndexTooLarge { index, max });
        }
        out.extend_from_slice(&index.to_be_bytes()[4 - size..]);
    }

    Ok(out)
}

/// Unpack a fixed-width encoding back into indices.
pub fn decode(bytes: &[u8], width: IndexWidth) -> Result<Vec<u32>, CodecError> {
    let size = width.bytes();
    if bytes.len() % size != 0 {
        return Err(CodecError::InvalidLength {
            len: bytes.len(),
            width: size,
        });
    }

    Ok(bytes
        .chunks_exact(size)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[4 - size..].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .collect())
}
