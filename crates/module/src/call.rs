//! Call message types for the auction module.

use borsh::{BorshDeserialize, BorshSerialize};
use candle_ranking::FraudReason;
use candle_types::{Hash32, Settings};

/// Call messages for the auction module.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum CandleCall {
    // === Bid Ledger ===
    /// Place a new bid; the attached value must equal `amount`.
    PlaceBid { auction_id: u64, amount: u64 },

    /// Add to an existing bid (owner only); the attached value must equal `added_amount`.
    IncreaseBid {
        auction_id: u64,
        index: u32,
        added_amount: u64,
    },

    // === Close ===
    /// Close bidding after the nominal duration and request entropy.
    Snuff { auction_id: u64 },

    /// Randomness oracle callback.
    FulfillRandomness { request_id: u64, random_word: Hash32 },

    // === Winner Determination ===
    /// Post a bonded winners proposal.
    ProposeWinners {
        auction_id: u64,
        encoding: Vec<u8>,
        commitment: Hash32,
        total_bid_amount: u64,
    },

    /// Dispute the live proposal with one counter-example.
    Challenge {
        auction_id: u64,
        encoding: Vec<u8>,
        claimed_hash: Hash32,
        disputed_index: u32,
    },

    // === Settlement ===
    /// Settle the item for the winner at `position` in the finalized list.
    ClaimWinningBid {
        auction_id: u64,
        encoding: Vec<u8>,
        position: u32,
    },

    /// Return a losing bid to its owner.
    WithdrawBid {
        auction_id: u64,
        encoding: Vec<u8>,
        index: u32,
    },

    /// Pay the snuff bounty to whoever closed the auction.
    ClaimSnuffBounty { auction_id: u64 },

    /// Pay the proposal bounty and return the deposit to the proposer.
    ClaimProposalBounty { auction_id: u64 },

    /// Sweep the remaining proceeds to the beneficiary.
    TransferProceeds { auction_id: u64 },

    // === Admin ===
    /// Replace the settings used by the next auction.
    UpdateSettings { settings: Settings },
}

/// Result of a dispatched call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    BidPlaced { index: u32 },
    BidIncreased { amount: u64 },
    Snuffed { next_auction_id: u64 },
    CloseResolved { close_offset: u32 },
    Proposed,
    ProposalOverturned { reason: FraudReason },
    ItemSettled { item_id: u64 },
    Paid { amount: u64 },
    SettingsUpdated,
}
