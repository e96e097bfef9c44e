//! Winner determination for optimistic candle auctions.
//!
//! Everything in this crate is a pure function of the bid ledger, the close
//! instant and the auction settings, so a proposer and any verifier recompute
//! exactly the same result:
//!
//! - `ranking`: the canonical total order and the winner set it selects
//! - `codec`: fixed-width packing of winner indices
//! - `commitment`: the hash binding a proposal to its packed indices
//! - `fraud`: locating a single deviation from the canonical result

pub mod codec;
pub mod commitment;
pub mod error;
pub mod fraud;
pub mod ranking;

pub use codec::{decode, encode};
pub use commitment::{commit_winners, commitment_hash, verify_commitment};
pub use error::CodecError;
pub use fraud::{find_fraud, FraudReason};
pub use ranking::{canonical_cmp, canonical_winners, compute_winners, expected_winner_count, WinnerSet};
