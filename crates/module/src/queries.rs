//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state.

use crate::bounty::{compute_bounties, Bounties};
use crate::state::AuctionState;
use candle_types::{Address, AuctionPhase, AuctionRecord, Bid, Settings};
use serde::{Deserialize, Serialize};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get auction details by ID.
    GetAuction { auction_id: u64 },

    /// Get all auctions (paginated, by ascending id).
    ListAuctions { offset: u64, limit: u64 },

    /// Get a page of an auction's bid ledger. `limit == 0` returns the rest.
    GetBids {
        auction_id: u64,
        page: u64,
        limit: u64,
    },

    /// Get a specific bid.
    GetBid { auction_id: u64, index: u32 },

    /// Get the auction currently accepting bids.
    GetCurrentAuction,

    /// Minimum bid of an auction.
    GetMinBid { auction_id: u64 },

    /// Deposit a proposal must carry.
    GetRequiredDeposit { auction_id: u64 },

    /// Close instant bounds.
    GetCloseBounds { auction_id: u64 },

    /// Recorded or estimated bounties.
    GetBounties { auction_id: u64 },

    /// Get a user's pull-payment balance.
    GetBalance { address: Address },

    /// Settings the next auction will use.
    GetSettings,
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    /// Auction details.
    Auction(Option<AuctionRecord>),

    /// List of auctions.
    AuctionList(Vec<AuctionSummary>),

    /// Page of bids.
    Bids(Vec<Bid>),

    /// Single bid.
    Bid(Option<Bid>),

    /// Minimum bid.
    MinBid(Option<u64>),

    /// Proposal deposit.
    RequiredDeposit(Option<u64>),

    /// Close instant bounds.
    CloseBounds(Option<CloseBounds>),

    /// Bounties.
    Bounties(Option<Bounties>),

    /// Balance.
    Balance(u64),

    /// Settings.
    Settings(Settings),
}

/// Handle a query.
pub fn handle_query(state: &AuctionState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetAuction { auction_id } => {
            AuctionQueryResponse::Auction(state.get_auction(auction_id).cloned())
        }

        AuctionQuery::ListAuctions { offset, limit } => AuctionQueryResponse::AuctionList(
            list_auctions(state, offset as usize, limit as usize),
        ),

        AuctionQuery::GetBids {
            auction_id,
            page,
            limit,
        } => AuctionQueryResponse::Bids(page_bids(state, auction_id, page as usize, limit as usize)),

        AuctionQuery::GetBid { auction_id, index } => {
            AuctionQueryResponse::Bid(state.get_bid(auction_id, index).cloned())
        }

        AuctionQuery::GetCurrentAuction => AuctionQueryResponse::Auction(
            state.get_auction(state.current_auction_id).cloned(),
        ),

        AuctionQuery::GetMinBid { auction_id } => {
            AuctionQueryResponse::MinBid(current_min_bid(state, auction_id))
        }

        AuctionQuery::GetRequiredDeposit { auction_id } => {
            AuctionQueryResponse::RequiredDeposit(required_deposit(state, auction_id))
        }

        AuctionQuery::GetCloseBounds { auction_id } => {
            AuctionQueryResponse::CloseBounds(close_bounds(state, auction_id))
        }

        AuctionQuery::GetBounties { auction_id } => {
            AuctionQueryResponse::Bounties(bounty_snapshot(state, auction_id))
        }

        AuctionQuery::GetBalance { address } => {
            AuctionQueryResponse::Balance(state.get_balance(&address))
        }

        AuctionQuery::GetSettings => AuctionQueryResponse::Settings(state.settings.clone()),
    }
}

/// Page through a bid ledger. `limit == 0` returns everything from `page` 0.
pub fn page_bids(state: &AuctionState, auction_id: u64, page: usize, limit: usize) -> Vec<Bid> {
    let bids = state.get_bids(auction_id);
    if limit == 0 {
        return bids.to_vec();
    }
    bids.iter()
        .skip(page.saturating_mul(limit))
        .take(limit)
        .cloned()
        .collect()
}

pub fn current_min_bid(state: &AuctionState, auction_id: u64) -> Option<u64> {
    state.get_auction(auction_id).map(|auction| auction.min_bid)
}

pub fn required_deposit(state: &AuctionState, auction_id: u64) -> Option<u64> {
    state
        .get_auction(auction_id)
        .map(|auction| auction.settings.deposit)
}

pub fn max_winners(state: &AuctionState, auction_id: u64) -> Option<u32> {
    state
        .get_auction(auction_id)
        .map(|auction| auction.settings.max_winners)
}

/// Window the close instant falls in, and the instant itself once resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseBounds {
    pub earliest: u64,
    pub latest: u64,
    pub resolved: Option<u64>,
}

pub fn close_bounds(state: &AuctionState, auction_id: u64) -> Option<CloseBounds> {
    let auction = state.get_auction(auction_id)?;
    let (earliest, latest) = auction.close_bounds();
    Some(CloseBounds {
        earliest,
        latest,
        resolved: auction.close_time(),
    })
}

/// Bounties fixed by the live proposal, or an estimate from the pooled
/// proceeds before one exists.
pub fn bounty_snapshot(state: &AuctionState, auction_id: u64) -> Option<Bounties> {
    let auction = state.get_auction(auction_id)?;
    if let Some(proposal) = &auction.proposal {
        return Some(Bounties {
            snuff: proposal.snuff_bounty,
            proposal: proposal.proposal_bounty,
        });
    }
    Some(compute_bounties(
        &auction.settings,
        auction.min_bid,
        auction.fee_observation.gas_price,
        auction.proceeds,
    ))
}

/// Summary of an auction for listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub phase: AuctionPhase,
    pub start_time: u64,
    pub bidding_deadline: u64,
    pub min_bid: u64,
    pub num_bids: usize,
    pub proceeds: u64,
}

impl AuctionSummary {
    /// Create summary from an auction record.
    pub fn from_auction(auction: &AuctionRecord, num_bids: usize) -> Self {
        Self {
            auction_id: auction.id,
            phase: auction.phase,
            start_time: auction.start_time,
            bidding_deadline: auction.bidding_deadline(),
            min_bid: auction.min_bid,
            num_bids,
            proceeds: auction.proceeds,
        }
    }
}

/// Get auction summaries for listing, by ascending id.
pub fn list_auctions(state: &AuctionState, offset: usize, limit: usize) -> Vec<AuctionSummary> {
    let mut auctions: Vec<&AuctionRecord> = state.auctions.values().collect();
    auctions.sort_by_key(|auction| auction.id);
    auctions
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|auction| AuctionSummary::from_auction(auction, state.get_bids(auction.id).len()))
        .collect()
}

/// Auctions whose entropy has resolved and which wait for a proposal.
pub fn get_awaiting_proposal(state: &AuctionState) -> Vec<u64> {
    let mut ids: Vec<u64> = state
        .auctions
        .values()
        .filter(|auction| auction.awaiting_proposal())
        .map(|auction| auction.id)
        .collect();
    ids.sort_unstable();
    ids
}

/// Auctions with a proposal still inside its fraud period.
pub fn get_challengeable(state: &AuctionState, now: u64) -> Vec<u64> {
    let mut ids: Vec<u64> = state
        .auctions
        .values()
        .filter(|auction| auction.phase_at(now) == AuctionPhase::WinnersProposed)
        .map(|auction| auction.id)
        .collect();
    ids.sort_unstable();
    ids
}
