//! Core type definitions for optimistic candle auctions.
//!
//! This crate provides the shared data structures used across the auction system:
//! the bid ledger entries, the per-auction settings snapshot, the auction record
//! and its phases, winner proposals, and the hashing helpers that derive seeds
//! from round entropy.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

pub mod proposal_io;

// =========================
// PRIMITIVES
// =========================

/// Generic address type (32 bytes)
pub type Address = [u8; 32];

/// 32-byte digest (commitments, entropy words, derived seeds)
pub type Hash32 = [u8; 32];

/// Upper bound for `Settings::snuff_percent`.
pub const MAX_SNUFF_PERCENT: u8 = 100;

/// Fixed width of one packed winner index.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum IndexWidth {
    /// 2-byte big-endian index, addresses up to 65_536 bids
    Two,
    /// 3-byte big-endian index, addresses up to 16_777_216 bids
    Three,
}

impl IndexWidth {
    /// Number of bytes per packed index.
    pub const fn bytes(self) -> usize {
        match self {
            IndexWidth::Two => 2,
            IndexWidth::Three => 3,
        }
    }

    /// Largest index representable at this width.
    pub const fn max_index(self) -> u32 {
        match self {
            IndexWidth::Two => 0xFFFF,
            IndexWidth::Three => 0xFF_FFFF,
        }
    }

    /// Number of distinct bid indices this width can address.
    pub const fn capacity(self) -> usize {
        self.max_index() as usize + 1
    }
}

// =========================
// SETTINGS
// =========================

/// Immutable per-auction configuration snapshot.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Settings {
    /// Nominal auction duration in seconds
    pub duration_secs: u64,
    /// Trailing share of the duration (percent) during which the true close is randomized
    pub snuff_percent: u8,
    /// Maximum number of winning bids
    pub max_winners: u32,
    /// Packed index width used for winner encodings
    pub index_width: IndexWidth,
    /// Bond posted with a winners proposal
    pub deposit: u64,
    /// Minimum amount unit; every bid is an exact multiple of it
    pub bid_precision: u64,
    /// Multiplier applied to gas-cost targets when sizing bounties
    pub max_bounty_multiplier: u64,
    /// Challenge window after a proposal, in seconds
    pub fraud_period_secs: u64,
    /// Gas spent by a snuff call
    pub snuff_gas: u64,
    /// Gas spent by a proposal call
    pub proposal_gas: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duration_secs: 3 * 24 * 3600, // 3 days
            snuff_percent: 30,
            max_winners: 32,
            index_width: IndexWidth::Two,
            deposit: 1_000_000,
            bid_precision: 1_000,
            max_bounty_multiplier: 2,
            fraud_period_secs: 3600, // 1 hour
            snuff_gas: 150_000,
            proposal_gas: 250_000,
        }
    }
}

impl Settings {
    /// Validate settings consistency.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.duration_secs == 0 {
            return Err("Duration cannot be zero");
        }
        if self.duration_secs > u64::from(u32::MAX) {
            return Err("Duration exceeds the bid timestamp range");
        }
        if self.snuff_percent > MAX_SNUFF_PERCENT {
            return Err("Snuff percent cannot exceed 100");
        }
        if self.max_winners == 0 {
            return Err("Max winners cannot be zero");
        }
        if self.max_winners as usize > self.index_width.capacity() {
            return Err("Max winners not addressable by index width");
        }
        if self.bid_precision == 0 {
            return Err("Bid precision cannot be zero");
        }
        if self.fraud_period_secs == 0 {
            return Err("Fraud period cannot be zero");
        }
        if self.max_bounty_multiplier == 0 {
            return Err("Bounty multiplier cannot be zero");
        }
        Ok(())
    }

    /// Length of the randomized close window, in seconds.
    pub fn snuff_window_len(&self) -> u64 {
        self.duration_secs * u64::from(self.snuff_percent) / 100
    }

    /// Offset from the auction start at which the randomized window opens.
    pub fn snuff_window_start(&self) -> u64 {
        self.duration_secs - self.snuff_window_len()
    }

    /// Derive the close instant (relative to the auction start) from round entropy.
    ///
    /// The result always lies in `[snuff_window_start, duration_secs]`.
    pub fn close_offset(&self, entropy: &Hash32) -> u32 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&entropy[..8]);
        let draw = u64::from_be_bytes(word) % (self.snuff_window_len() + 1);
        // duration_secs fits in u32 (see validate)
        u32::try_from(self.snuff_window_start() + draw).unwrap_or(u32::MAX)
    }

    /// Round an amount up to the next multiple of the bid precision.
    pub fn round_up_to_precision(&self, amount: u64) -> u64 {
        let precision = self.bid_precision.max(1);
        amount.div_ceil(precision).saturating_mul(precision).max(precision)
    }
}

// =========================
// AUCTION TYPES
// =========================

/// Auction lifecycle phase
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionPhase {
    /// Before start_time
    Created,
    /// Accepting bids
    Running,
    /// Snuffed; awaiting entropy, then awaiting a winners proposal
    WaitingClose,
    /// A proposal is posted and may still be challenged
    WinnersProposed,
    /// Challenge period elapsed; claims and transfers permitted
    Finalized,
    /// Ledger was empty at close
    EndedWithoutBids,
}

/// A single bid in an auction's append-only ledger.
///
/// The bid's index (its position in the ledger) is its identity.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: Address,
    /// Seconds since auction start
    pub timestamp: u32,
    pub amount: u64,
    /// Claimed (winner) or withdrawn (loser)
    pub processed: bool,
}

impl Bid {
    /// Whether the bid was placed strictly before the close instant.
    pub fn is_eligible(&self, close_offset: u32) -> bool {
        self.timestamp < close_offset
    }
}

/// Gas price observed when the previous round closed.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct FeeObservation {
    pub gas_price: u64,
    pub observed_at: u64,
}

/// Who triggered close randomization, for bounty attribution.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SnuffRecord {
    pub sender: Address,
    pub timestamp: u64,
}

/// A bonded claim naming the winning bid indices by commitment.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct WinnersProposal {
    #[serde_as(as = "Hex")]
    pub commitment: Hash32,
    pub proposer: Address,
    pub deposit: u64,
    pub snuff_bounty: u64,
    pub proposal_bounty: u64,
    pub timestamp: u64,
    pub winner_count: u32,
    pub total_bid_amount: u64,
    pub snuff_bounty_claimed: bool,
    pub proposal_bounty_claimed: bool,
}

/// Full per-round auction record.
#[serde_as]
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub id: u64,
    pub start_time: u64,
    pub settings: Settings,
    pub min_bid: u64,
    pub fee_observation: FeeObservation,
    pub phase: AuctionPhase,

    // Close resolution
    #[serde_as(as = "Option<Hex>")]
    pub entropy: Option<Hash32>,
    pub close_offset: Option<u32>,
    pub randomness_request: Option<u64>,

    // Winner determination
    pub proposal: Option<WinnersProposal>,
    pub snuff: Option<SnuffRecord>,

    // Accounting
    /// Pooled bid value still held by this auction
    pub proceeds: u64,
    pub funds_moved: bool,
    pub claimed_winners: u32,
}

impl AuctionRecord {
    /// Absolute time after which no bids are accepted.
    pub fn bidding_deadline(&self) -> u64 {
        self.start_time + self.settings.duration_secs
    }

    /// Absolute bounds `(earliest, latest)` of the randomized close instant.
    pub fn close_bounds(&self) -> (u64, u64) {
        (
            self.start_time + self.settings.snuff_window_start(),
            self.bidding_deadline(),
        )
    }

    /// Absolute close instant, once entropy has resolved.
    pub fn close_time(&self) -> Option<u64> {
        self.close_offset
            .map(|offset| self.start_time + u64::from(offset))
    }

    /// End of the challenge window for the live proposal.
    pub fn challenge_deadline(&self) -> Option<u64> {
        self.proposal
            .as_ref()
            .map(|p| p.timestamp + self.settings.fraud_period_secs)
    }

    /// Effective phase at `now`, resolving the time-derived phases.
    pub fn phase_at(&self, now: u64) -> AuctionPhase {
        match self.phase {
            AuctionPhase::Running if now < self.start_time => AuctionPhase::Created,
            AuctionPhase::WinnersProposed => match self.challenge_deadline() {
                Some(deadline) if now > deadline => AuctionPhase::Finalized,
                _ => AuctionPhase::WinnersProposed,
            },
            phase => phase,
        }
    }

    /// Whether entropy has resolved and the auction accepts a proposal.
    pub fn awaiting_proposal(&self) -> bool {
        self.phase == AuctionPhase::WaitingClose && self.entropy.is_some()
    }
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Compute the seed sent to the randomness oracle for an auction.
pub fn compute_randomness_seed(auction_id: u64, start_time: u64) -> Hash32 {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"CANDLE_RANDOMNESS_SEED_V1:");
    hasher.update(auction_id.to_le_bytes());
    hasher.update(start_time.to_le_bytes());
    hasher.finalize().into()
}

/// Derive the per-winner entropy handed to the item settler.
///
/// Each winner receives an independent-looking value from the shared round entropy.
pub fn derive_item_seed(entropy: &Hash32, bid_index: u32) -> Hash32 {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"CANDLE_ITEM_SEED_V1:");
    hasher.update(entropy);
    hasher.update(bid_index.to_be_bytes());
    hasher.finalize().into()
}
