//! Challenge handling.
//!
//! A live proposal can be overturned during its fraud period by anyone who
//! resubmits the committed encoding together with a single counter-example.
//! A successful challenge pays the proposer's deposit to the challenger and
//! reopens the auction for a fresh proposal.

use crate::error::AuctionError;
use crate::handlers::{CallContext, HandlerResult};
use crate::state::AuctionState;
use candle_ranking::{commitment_hash, decode, find_fraud, FraudReason};
use candle_types::{AuctionPhase, Hash32};
use tracing::{debug, warn};

/// Handle Challenge call. Returns the fraud found.
pub fn handle_challenge(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
    encoding: &[u8],
    claimed_hash: Hash32,
    disputed_index: u32,
) -> HandlerResult<FraudReason> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    match auction.phase_at(ctx.timestamp) {
        AuctionPhase::WinnersProposed => {}
        AuctionPhase::Finalized => return Err(AuctionError::ChallengePeriodOver),
        got => {
            return Err(AuctionError::InvalidState {
                expected: AuctionPhase::WinnersProposed,
                got,
            })
        }
    }

    let (Some(proposal), Some(entropy), Some(close_offset)) =
        (auction.proposal.as_ref(), auction.entropy, auction.close_offset)
    else {
        return Err(AuctionError::EntropyPending);
    };

    let hash = commitment_hash(encoding, &entropy);
    if hash != claimed_hash || hash != proposal.commitment {
        return Err(AuctionError::CommitmentMismatch);
    }
    if ctx.sender == proposal.proposer {
        return Err(AuctionError::SelfChallenge);
    }

    let claimed = decode(encoding, auction.settings.index_width)?;
    let reason = find_fraud(
        state.get_bids(auction_id),
        close_offset,
        auction.settings.max_winners,
        &claimed,
        proposal.total_bid_amount,
        disputed_index,
    );
    let Some(reason) = reason else {
        debug!(auction_id, disputed_index, "challenge found no fraud");
        return Err(AuctionError::ChallengeFailed);
    };

    let deposit = proposal.deposit;
    let proposer = proposal.proposer;
    if state.get_balance(&ctx.sender).checked_add(deposit).is_none() {
        return Err(AuctionError::AmountOverflow);
    }

    if let Some(auction) = state.auctions.get_mut(&auction_id) {
        auction.proposal = None;
        auction.phase = AuctionPhase::WaitingClose;
    }
    state.credit_balance(ctx.sender, deposit);

    warn!(
        auction_id,
        %reason,
        disputed_index,
        proposer = %hex::encode(proposer),
        challenger = %hex::encode(ctx.sender),
        deposit,
        "winners proposal overturned"
    );
    Ok(reason)
}
