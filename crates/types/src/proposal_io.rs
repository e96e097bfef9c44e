//! Input and output types for off-path winner computation.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{Bid, Hash32, IndexWidth};

/// Snapshot of everything a proposer needs to recompute the canonical winners.
#[serde_as]
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ProposalInput {
    /// Auction identifier
    pub auction_id: u64,

    /// Full bid ledger, in index order
    pub bids: Vec<Bid>,

    /// Close instant relative to the auction start
    pub close_offset: u32,

    /// Resolved round entropy (bound into the commitment)
    #[serde_as(as = "Hex")]
    pub entropy: Hash32,

    /// Maximum number of winners
    pub max_winners: u32,

    /// Packed index width
    pub index_width: IndexWidth,
}

impl ProposalInput {
    /// Validate input consistency
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.bids.is_empty() {
            return Err("No bids to rank");
        }
        if self.max_winners == 0 {
            return Err("Max winners cannot be zero");
        }
        if self.bids.len() > self.index_width.capacity() {
            return Err("Bid count exceeds index width");
        }
        Ok(())
    }
}

/// A proposal ready for submission.
#[serde_as]
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ProposalOutput {
    /// Auction identifier
    pub auction_id: u64,

    /// Winning bid indices in canonical order
    pub winners: Vec<u32>,

    /// Packed winner indices
    #[serde_as(as = "Hex")]
    pub encoding: Vec<u8>,

    /// Commitment over the encoding and round entropy
    #[serde_as(as = "Hex")]
    pub commitment: Hash32,

    /// Sum of the winners' bid amounts
    pub total_bid_amount: u64,
}
