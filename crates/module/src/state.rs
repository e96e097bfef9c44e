//! State structures for the auction module.

use candle_types::{Address, AuctionRecord, Bid, Settings};
use std::collections::HashMap;

/// Auction module state.
///
/// One auction is `Running` at a time; the previous one may still be settling.
/// Rounds are addressed by monotonically increasing id and share nothing except
/// the fee observation handed forward when a round closes.
#[derive(Debug, Default)]
pub struct AuctionState {
    /// Next auction ID to assign
    pub next_auction_id: u64,

    /// Auction currently accepting bids
    pub current_auction_id: u64,

    /// All auctions by ID
    pub auctions: HashMap<u64, AuctionRecord>,

    /// Append-only bid ledgers: auction_id -> bids in index order
    pub bids: HashMap<u64, Vec<Bid>>,

    /// Outstanding randomness requests: request_id -> auction_id
    pub randomness_requests: HashMap<u64, u64>,

    /// Pull-payment balances credited by payouts
    pub balances: HashMap<Address, u64>,

    /// Settings snapshotted into the next auction
    pub settings: Settings,

    /// May update settings
    pub admin: Address,

    /// Receives swept proceeds
    pub beneficiary: Address,

    /// Only sender allowed to deliver randomness
    pub oracle: Address,
}

impl AuctionState {
    /// Create a new auction state.
    pub fn new() -> Self {
        Self {
            next_auction_id: 1,
            ..Default::default()
        }
    }

    /// Get the next auction ID and increment.
    pub fn allocate_auction_id(&mut self) -> u64 {
        let id = self.next_auction_id;
        self.next_auction_id += 1;
        id
    }

    /// Get auction by ID.
    pub fn get_auction(&self, auction_id: u64) -> Option<&AuctionRecord> {
        self.auctions.get(&auction_id)
    }

    /// Get mutable auction by ID.
    pub fn get_auction_mut(&mut self, auction_id: u64) -> Option<&mut AuctionRecord> {
        self.auctions.get_mut(&auction_id)
    }

    /// Get the bid ledger of an auction.
    pub fn get_bids(&self, auction_id: u64) -> &[Bid] {
        self.bids
            .get(&auction_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Get a single bid.
    pub fn get_bid(&self, auction_id: u64, index: u32) -> Option<&Bid> {
        self.get_bids(auction_id).get(index as usize)
    }

    /// Get mutable bid.
    pub fn get_bid_mut(&mut self, auction_id: u64, index: u32) -> Option<&mut Bid> {
        self.bids
            .get_mut(&auction_id)
            .and_then(|bids| bids.get_mut(index as usize))
    }

    /// Get user's balance.
    pub fn get_balance(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Add to user's balance. Returns false (and changes nothing) on overflow.
    pub fn credit_balance(&mut self, address: Address, amount: u64) -> bool {
        let entry = self.balances.entry(address).or_insert(0);
        match entry.checked_add(amount) {
            Some(total) => {
                *entry = total;
                true
            }
            None => false,
        }
    }
}
