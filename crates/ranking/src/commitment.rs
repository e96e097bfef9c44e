//! Commitments binding a proposal to its packed winner indices.
//!
//! The commitment is the only artifact kept in long-term state. Whoever claims,
//! withdraws or challenges supplies the encoding again, and it is checked
//! against the stored hash.
//!
//! The round entropy is appended to the encoding before hashing, so a
//! commitment for one round can never be replayed against another.

use candle_types::{Hash32, IndexWidth};
use sha3::{Digest, Keccak256};

use crate::codec::encode;
use crate::error::CodecError;

/// Compute the commitment over a packed encoding and the round entropy.
pub fn commitment_hash(encoding: &[u8], entropy: &Hash32) -> Hash32 {
    let mut hasher = Keccak256::new();
    hasher.update(encoding);
    hasher.update(entropy);
    hasher.finalize().into()
}

/// Check that an encoding opens the given commitment.
pub fn verify_commitment(encoding: &[u8], entropy: &Hash32, expected: &Hash32) -> bool {
    commitment_hash(encoding, entropy) == *expected
}

/// Encode winner indices and commit to them in one step.
pub fn commit_winners(
    indices: &[u32],
    width: IndexWidth,
    entropy: &Hash32,
) -> Result<(Vec<u8>, Hash32), CodecError> {
    let encoding = encode(indices, width)?;
    let commitment = commitment_hash(&encoding, entropy);
    Ok((encoding, commitment))
}
