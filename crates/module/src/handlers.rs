//! Call handlers for the auction module.
//!
//! These functions implement the business logic for each call type. Every
//! precondition is checked before the first write, so a rejected call leaves
//! the state exactly as it was.

use crate::bounty::compute_bounties;
use crate::call::{CallOutcome, CandleCall};
use crate::challenge::handle_challenge;
use crate::error::AuctionError;
use crate::external::{Collaborators, ItemSettler, RandomnessOracle};
use crate::genesis::CandleGenesisConfig;
use crate::state::AuctionState;
use candle_ranking::{decode, verify_commitment};
use candle_types::{
    compute_randomness_seed, derive_item_seed, Address, AuctionPhase, AuctionRecord, Bid,
    FeeObservation, Hash32, Settings, SnuffRecord, WinnersProposal,
};
use tracing::{debug, info};

/// Context provided by the runtime for each call.
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
    /// Current timestamp
    pub timestamp: u64,
    /// Value attached to the call (bids, deposits)
    pub value: u64,
    /// Gas price paid by the call
    pub gas_price: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Build the module state from genesis and start the first auction.
pub fn handle_genesis(
    config: &CandleGenesisConfig,
    settler: &dyn ItemSettler,
) -> HandlerResult<AuctionState> {
    config
        .validate()
        .map_err(|e| AuctionError::InvalidSettings(e.to_string()))?;

    let mut state = AuctionState::new();
    state.admin = config.admin;
    state.beneficiary = config.beneficiary;
    state.oracle = config.oracle;
    state.settings = config.settings.clone();

    let fee_observation = FeeObservation {
        gas_price: config.initial_gas_price,
        observed_at: config.start_time,
    };
    start_auction(&mut state, config.start_time, fee_observation, settler);

    Ok(state)
}

/// Create and start a new auction from the current settings.
///
/// The minimum bid covers settling one item at the observed gas price.
pub(crate) fn start_auction(
    state: &mut AuctionState,
    start_time: u64,
    fee_observation: FeeObservation,
    settler: &dyn ItemSettler,
) -> u64 {
    let settings = state.settings.clone();
    let settlement_cost = fee_observation
        .gas_price
        .saturating_mul(settler.estimated_settlement_gas());
    let min_bid = settings.round_up_to_precision(settlement_cost);

    let auction_id = state.allocate_auction_id();
    let record = AuctionRecord {
        id: auction_id,
        start_time,
        settings,
        min_bid,
        fee_observation,
        phase: AuctionPhase::Running,
        entropy: None,
        close_offset: None,
        randomness_request: None,
        proposal: None,
        snuff: None,
        proceeds: 0,
        funds_moved: false,
        claimed_winners: 0,
    };

    state.auctions.insert(auction_id, record);
    state.bids.insert(auction_id, Vec::new());
    state.current_auction_id = auction_id;

    info!(auction_id, start_time, min_bid, "auction started");
    auction_id
}

fn get_auction(state: &AuctionState, auction_id: u64) -> HandlerResult<&AuctionRecord> {
    state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))
}

fn require_phase(auction: &AuctionRecord, now: u64, expected: AuctionPhase) -> HandlerResult<()> {
    let got = auction.phase_at(now);
    if got != expected {
        return Err(AuctionError::InvalidState { expected, got });
    }
    Ok(())
}

fn check_bidding_open(auction: &AuctionRecord, now: u64) -> HandlerResult<()> {
    match auction.phase_at(now) {
        AuctionPhase::Running => {}
        AuctionPhase::Created => return Err(AuctionError::BiddingNotStarted),
        got => {
            return Err(AuctionError::InvalidState {
                expected: AuctionPhase::Running,
                got,
            })
        }
    }
    if now >= auction.bidding_deadline() {
        return Err(AuctionError::BiddingEnded);
    }
    Ok(())
}

fn check_precision(settings: &Settings, amount: u64) -> HandlerResult<()> {
    if amount == 0 || amount % settings.bid_precision != 0 {
        return Err(AuctionError::InvalidPrecision {
            amount,
            precision: settings.bid_precision,
        });
    }
    Ok(())
}

fn check_value(ctx: &CallContext, expected: u64) -> HandlerResult<()> {
    if ctx.value != expected {
        return Err(AuctionError::ValueMismatch {
            expected,
            got: ctx.value,
        });
    }
    Ok(())
}

fn relative_timestamp(auction: &AuctionRecord, now: u64) -> HandlerResult<u32> {
    u32::try_from(now.saturating_sub(auction.start_time)).map_err(|_| AuctionError::TimestampOverflow)
}

// =========================
// BID LEDGER
// =========================

/// Handle PlaceBid call. Returns the new bid's index.
pub fn handle_place_bid(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
    amount: u64,
) -> HandlerResult<u32> {
    let auction = get_auction(state, auction_id)?;
    check_bidding_open(auction, ctx.timestamp)?;
    check_value(ctx, amount)?;
    check_precision(&auction.settings, amount)?;

    if amount < auction.min_bid {
        return Err(AuctionError::BidBelowMinimum {
            minimum: auction.min_bid,
            got: amount,
        });
    }

    let index = state.get_bids(auction_id).len();
    if index >= auction.settings.index_width.capacity() {
        return Err(AuctionError::LedgerFull);
    }

    let timestamp = relative_timestamp(auction, ctx.timestamp)?;
    let proceeds = auction
        .proceeds
        .checked_add(amount)
        .ok_or(AuctionError::AmountOverflow)?;

    if let Some(auction) = state.auctions.get_mut(&auction_id) {
        auction.proceeds = proceeds;
    }
    state.bids.entry(auction_id).or_default().push(Bid {
        bidder: ctx.sender,
        timestamp,
        amount,
        processed: false,
    });

    debug!(auction_id, index, amount, timestamp, "bid placed");
    Ok(index as u32)
}

/// Handle IncreaseBid call. Returns the bid's new amount.
///
/// The bid's timestamp moves to the current time, so raising a bid after the
/// close instant makes it a late bid.
pub fn handle_increase_bid(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
    index: u32,
    added_amount: u64,
) -> HandlerResult<u64> {
    let auction = get_auction(state, auction_id)?;
    check_bidding_open(auction, ctx.timestamp)?;
    check_value(ctx, added_amount)?;
    check_precision(&auction.settings, added_amount)?;

    let bid = state
        .get_bid(auction_id, index)
        .ok_or(AuctionError::BidNotFound(index))?;
    if bid.bidder != ctx.sender {
        return Err(AuctionError::NotBidOwner(index));
    }

    let amount = bid
        .amount
        .checked_add(added_amount)
        .ok_or(AuctionError::AmountOverflow)?;
    let proceeds = auction
        .proceeds
        .checked_add(added_amount)
        .ok_or(AuctionError::AmountOverflow)?;
    let timestamp = relative_timestamp(auction, ctx.timestamp)?;

    if let Some(auction) = state.auctions.get_mut(&auction_id) {
        auction.proceeds = proceeds;
    }
    if let Some(bid) = state.get_bid_mut(auction_id, index) {
        bid.amount = amount;
        bid.timestamp = timestamp;
    }

    debug!(auction_id, index, amount, timestamp, "bid increased");
    Ok(amount)
}

// =========================
// CLOSE
// =========================

/// Handle Snuff call. Returns the id of the auction started in its place.
///
/// An empty ledger ends the auction immediately; otherwise entropy is
/// requested and the auction waits for the oracle callback.
pub fn handle_snuff(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
    oracle: &mut dyn RandomnessOracle,
    settler: &dyn ItemSettler,
) -> HandlerResult<u64> {
    let auction = get_auction(state, auction_id)?;
    require_phase(auction, ctx.timestamp, AuctionPhase::Running)?;

    let deadline = auction.bidding_deadline();
    if ctx.timestamp < deadline {
        return Err(AuctionError::CloseNotReached { deadline });
    }

    // Only one auction may be in winner determination at a time.
    if let Some(previous) = auction_id
        .checked_sub(1)
        .and_then(|id| state.get_auction(id))
    {
        if matches!(
            previous.phase_at(ctx.timestamp),
            AuctionPhase::WaitingClose | AuctionPhase::WinnersProposed
        ) {
            return Err(AuctionError::SettlingSlotBusy(previous.id));
        }
    }

    let request_id = if state.get_bids(auction_id).is_empty() {
        None
    } else {
        let seed = compute_randomness_seed(auction_id, auction.start_time);
        Some(oracle.request(&seed)?)
    };

    if let Some(auction) = state.auctions.get_mut(&auction_id) {
        auction.snuff = Some(SnuffRecord {
            sender: ctx.sender,
            timestamp: ctx.timestamp,
        });
        match request_id {
            Some(request_id) => {
                auction.phase = AuctionPhase::WaitingClose;
                auction.randomness_request = Some(request_id);
                info!(auction_id, request_id, "auction snuffed, entropy requested");
            }
            None => {
                auction.phase = AuctionPhase::EndedWithoutBids;
                info!(auction_id, "auction ended without bids");
            }
        }
    }
    if let Some(request_id) = request_id {
        state.randomness_requests.insert(request_id, auction_id);
    }

    let fee_observation = FeeObservation {
        gas_price: ctx.gas_price,
        observed_at: ctx.timestamp,
    };
    Ok(start_auction(state, ctx.timestamp, fee_observation, settler))
}

/// Handle FulfillRandomness callback. Returns the resolved close offset.
pub fn handle_fulfill_randomness(
    state: &mut AuctionState,
    ctx: &CallContext,
    request_id: u64,
    random_word: Hash32,
) -> HandlerResult<u32> {
    if ctx.sender != state.oracle {
        return Err(AuctionError::NotOracle);
    }

    let auction_id = *state
        .randomness_requests
        .get(&request_id)
        .ok_or(AuctionError::UnknownRandomnessRequest(request_id))?;
    let auction = state
        .auctions
        .get_mut(&auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    if auction.phase != AuctionPhase::WaitingClose || auction.randomness_request != Some(request_id)
    {
        return Err(AuctionError::UnknownRandomnessRequest(request_id));
    }
    if auction.entropy.is_some() {
        return Err(AuctionError::EntropyAlreadySet);
    }

    let close_offset = auction.settings.close_offset(&random_word);
    auction.entropy = Some(random_word);
    auction.close_offset = Some(close_offset);

    info!(
        auction_id,
        close_offset,
        close_time = auction.start_time + u64::from(close_offset),
        "close instant resolved"
    );
    Ok(close_offset)
}

// =========================
// WINNER DETERMINATION
// =========================

/// Handle ProposeWinners call.
///
/// Only the commitment is checked here; the content is trusted until
/// challenged.
pub fn handle_propose_winners(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
    encoding: &[u8],
    commitment: Hash32,
    total_bid_amount: u64,
) -> HandlerResult<()> {
    let auction = get_auction(state, auction_id)?;
    require_phase(auction, ctx.timestamp, AuctionPhase::WaitingClose)?;
    let entropy = auction.entropy.ok_or(AuctionError::EntropyPending)?;

    if ctx.value < auction.settings.deposit {
        return Err(AuctionError::InsufficientDeposit {
            required: auction.settings.deposit,
            got: ctx.value,
        });
    }

    let winners = decode(encoding, auction.settings.index_width)?;
    if !verify_commitment(encoding, &entropy, &commitment) {
        return Err(AuctionError::CommitmentMismatch);
    }

    let bounties = compute_bounties(
        &auction.settings,
        auction.min_bid,
        auction.fee_observation.gas_price,
        total_bid_amount,
    );
    let proposal = WinnersProposal {
        commitment,
        proposer: ctx.sender,
        deposit: ctx.value,
        snuff_bounty: bounties.snuff,
        proposal_bounty: bounties.proposal,
        timestamp: ctx.timestamp,
        winner_count: winners.len() as u32,
        total_bid_amount,
        snuff_bounty_claimed: false,
        proposal_bounty_claimed: false,
    };

    if let Some(auction) = state.auctions.get_mut(&auction_id) {
        auction.proposal = Some(proposal);
        auction.phase = AuctionPhase::WinnersProposed;
    }

    info!(
        auction_id,
        proposer = %hex::encode(ctx.sender),
        commitment = %hex::encode(commitment),
        winners = winners.len(),
        total_bid_amount,
        "winners proposed"
    );
    Ok(())
}

// =========================
// SETTLEMENT
// =========================

/// The finalized auction and its unchallenged proposal.
fn finalized_proposal(
    state: &AuctionState,
    now: u64,
    auction_id: u64,
) -> HandlerResult<(&AuctionRecord, &WinnersProposal)> {
    let auction = get_auction(state, auction_id)?;
    require_phase(auction, now, AuctionPhase::Finalized)?;
    let proposal = auction
        .proposal
        .as_ref()
        .ok_or(AuctionError::InvalidState {
            expected: AuctionPhase::Finalized,
            got: auction.phase,
        })?;
    Ok((auction, proposal))
}

/// Decode a resubmitted encoding of the finalized winners.
fn finalized_winners(
    state: &AuctionState,
    now: u64,
    auction_id: u64,
    encoding: &[u8],
) -> HandlerResult<Vec<u32>> {
    let (auction, proposal) = finalized_proposal(state, now, auction_id)?;
    let entropy = auction.entropy.ok_or(AuctionError::EntropyPending)?;
    if !verify_commitment(encoding, &entropy, &proposal.commitment) {
        return Err(AuctionError::CommitmentMismatch);
    }
    Ok(decode(encoding, auction.settings.index_width)?)
}

/// Move value out of an auction into `recipient`'s balance.
///
/// `from_proceeds` comes out of the pooled bids, `from_deposits` out of the
/// held proposal bond. Nothing is written unless the whole payout fits.
fn pay_out(
    state: &mut AuctionState,
    auction_id: u64,
    recipient: Address,
    from_proceeds: u64,
    from_deposits: u64,
) -> HandlerResult<()> {
    let available = get_auction(state, auction_id)?.proceeds;
    if available < from_proceeds {
        return Err(AuctionError::Insolvent {
            required: from_proceeds,
            available,
        });
    }

    let credit = from_proceeds
        .checked_add(from_deposits)
        .ok_or(AuctionError::AmountOverflow)?;
    if state.get_balance(&recipient).checked_add(credit).is_none() {
        return Err(AuctionError::AmountOverflow);
    }

    if let Some(auction) = state.auctions.get_mut(&auction_id) {
        auction.proceeds = available - from_proceeds;
    }
    state.credit_balance(recipient, credit);
    Ok(())
}

/// Handle ClaimWinningBid call. Returns the settled item's id.
///
/// Anyone may claim; the item always goes to the bidder.
pub fn handle_claim_winning_bid(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
    encoding: &[u8],
    position: u32,
    settler: &mut dyn ItemSettler,
) -> HandlerResult<u64> {
    let winners = finalized_winners(state, ctx.timestamp, auction_id, encoding)?;
    let index = *winners
        .get(position as usize)
        .ok_or(AuctionError::PositionOutOfRange {
            position,
            count: winners.len() as u32,
        })?;

    let bid = state
        .get_bid(auction_id, index)
        .ok_or(AuctionError::BidNotFound(index))?;
    if bid.processed {
        return Err(AuctionError::AlreadyProcessed(index));
    }
    let bidder = bid.bidder;
    let entropy = get_auction(state, auction_id)?
        .entropy
        .ok_or(AuctionError::EntropyPending)?;

    let item_id = settler.settle(&bidder, &derive_item_seed(&entropy, index))?;

    if let Some(bid) = state.get_bid_mut(auction_id, index) {
        bid.processed = true;
    }
    if let Some(auction) = state.auctions.get_mut(&auction_id) {
        auction.claimed_winners += 1;
    }

    info!(auction_id, index, item_id, winner = %hex::encode(bidder), "winning bid claimed");
    Ok(item_id)
}

/// Handle WithdrawBid call. Returns the refunded amount.
pub fn handle_withdraw_bid(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
    encoding: &[u8],
    index: u32,
) -> HandlerResult<u64> {
    let winners = finalized_winners(state, ctx.timestamp, auction_id, encoding)?;

    let bid = state
        .get_bid(auction_id, index)
        .ok_or(AuctionError::BidNotFound(index))?;
    if bid.bidder != ctx.sender {
        return Err(AuctionError::NotBidOwner(index));
    }
    if winners.contains(&index) {
        return Err(AuctionError::WinnerCannotWithdraw(index));
    }
    if bid.processed {
        return Err(AuctionError::AlreadyProcessed(index));
    }
    let amount = bid.amount;

    pay_out(state, auction_id, ctx.sender, amount, 0)?;
    if let Some(bid) = state.get_bid_mut(auction_id, index) {
        bid.processed = true;
    }

    debug!(auction_id, index, amount, "losing bid withdrawn");
    Ok(amount)
}

/// Handle ClaimSnuffBounty call. Pays whoever snuffed the auction.
pub fn handle_claim_snuff_bounty(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<u64> {
    let (auction, proposal) = finalized_proposal(state, ctx.timestamp, auction_id)?;
    if proposal.snuff_bounty_claimed {
        return Err(AuctionError::BountyAlreadyClaimed);
    }
    let snuffer = auction
        .snuff
        .as_ref()
        .map(|snuff| snuff.sender)
        .ok_or(AuctionError::InvalidState {
            expected: AuctionPhase::Finalized,
            got: auction.phase,
        })?;
    let amount = proposal.snuff_bounty;

    pay_out(state, auction_id, snuffer, amount, 0)?;
    if let Some(proposal) = state
        .auctions
        .get_mut(&auction_id)
        .and_then(|auction| auction.proposal.as_mut())
    {
        proposal.snuff_bounty_claimed = true;
    }

    info!(auction_id, amount, "snuff bounty claimed");
    Ok(amount)
}

/// Handle ClaimProposalBounty call. Pays the bounty and returns the deposit.
pub fn handle_claim_proposal_bounty(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<u64> {
    let (_, proposal) = finalized_proposal(state, ctx.timestamp, auction_id)?;
    if proposal.proposal_bounty_claimed {
        return Err(AuctionError::BountyAlreadyClaimed);
    }
    let proposer = proposal.proposer;
    let bounty = proposal.proposal_bounty;
    let deposit = proposal.deposit;

    pay_out(state, auction_id, proposer, bounty, deposit)?;
    if let Some(proposal) = state
        .auctions
        .get_mut(&auction_id)
        .and_then(|auction| auction.proposal.as_mut())
    {
        proposal.proposal_bounty_claimed = true;
    }

    info!(auction_id, bounty, deposit, "proposal bounty claimed");
    Ok(bounty + deposit)
}

/// Handle TransferProceeds call. Sweeps the winners' proceeds, minus bounties,
/// to the beneficiary.
pub fn handle_transfer_proceeds(
    state: &mut AuctionState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<u64> {
    let (auction, proposal) = finalized_proposal(state, ctx.timestamp, auction_id)?;
    if auction.funds_moved {
        return Err(AuctionError::FundsAlreadyMoved);
    }
    let amount = proposal
        .total_bid_amount
        .saturating_sub(proposal.snuff_bounty + proposal.proposal_bounty);
    let beneficiary = state.beneficiary;

    pay_out(state, auction_id, beneficiary, amount, 0)?;
    if let Some(auction) = state.auctions.get_mut(&auction_id) {
        auction.funds_moved = true;
    }

    info!(auction_id, amount, "proceeds transferred");
    Ok(amount)
}

// =========================
// ADMIN
// =========================

/// Handle UpdateSettings call. Takes effect from the next auction.
pub fn handle_update_settings(
    state: &mut AuctionState,
    ctx: &CallContext,
    settings: Settings,
) -> HandlerResult<()> {
    if ctx.sender != state.admin {
        return Err(AuctionError::NotAuthorized);
    }
    settings
        .validate()
        .map_err(|e| AuctionError::InvalidSettings(e.into()))?;
    state.settings = settings;
    Ok(())
}

/// Route a call message to its handler.
pub fn dispatch(
    state: &mut AuctionState,
    ctx: &CallContext,
    call: CandleCall,
    collaborators: &mut Collaborators<'_>,
) -> HandlerResult<CallOutcome> {
    match call {
        CandleCall::PlaceBid { auction_id, amount } => {
            handle_place_bid(state, ctx, auction_id, amount)
                .map(|index| CallOutcome::BidPlaced { index })
        }
        CandleCall::IncreaseBid {
            auction_id,
            index,
            added_amount,
        } => handle_increase_bid(state, ctx, auction_id, index, added_amount)
            .map(|amount| CallOutcome::BidIncreased { amount }),
        CandleCall::Snuff { auction_id } => handle_snuff(
            state,
            ctx,
            auction_id,
            &mut *collaborators.oracle,
            &*collaborators.settler,
        )
        .map(|next_auction_id| CallOutcome::Snuffed { next_auction_id }),
        CandleCall::FulfillRandomness {
            request_id,
            random_word,
        } => handle_fulfill_randomness(state, ctx, request_id, random_word)
            .map(|close_offset| CallOutcome::CloseResolved { close_offset }),
        CandleCall::ProposeWinners {
            auction_id,
            encoding,
            commitment,
            total_bid_amount,
        } => handle_propose_winners(state, ctx, auction_id, &encoding, commitment, total_bid_amount)
            .map(|()| CallOutcome::Proposed),
        CandleCall::Challenge {
            auction_id,
            encoding,
            claimed_hash,
            disputed_index,
        } => handle_challenge(state, ctx, auction_id, &encoding, claimed_hash, disputed_index)
            .map(|reason| CallOutcome::ProposalOverturned { reason }),
        CandleCall::ClaimWinningBid {
            auction_id,
            encoding,
            position,
        } => handle_claim_winning_bid(
            state,
            ctx,
            auction_id,
            &encoding,
            position,
            &mut *collaborators.settler,
        )
        .map(|item_id| CallOutcome::ItemSettled { item_id }),
        CandleCall::WithdrawBid {
            auction_id,
            encoding,
            index,
        } => handle_withdraw_bid(state, ctx, auction_id, &encoding, index)
            .map(|amount| CallOutcome::Paid { amount }),
        CandleCall::ClaimSnuffBounty { auction_id } => {
            handle_claim_snuff_bounty(state, ctx, auction_id)
                .map(|amount| CallOutcome::Paid { amount })
        }
        CandleCall::ClaimProposalBounty { auction_id } => {
            handle_claim_proposal_bounty(state, ctx, auction_id)
                .map(|amount| CallOutcome::Paid { amount })
        }
        CandleCall::TransferProceeds { auction_id } => {
            handle_transfer_proceeds(state, ctx, auction_id)
                .map(|amount| CallOutcome::Paid { amount })
        }
        CandleCall::UpdateSettings { settings } => {
            handle_update_settings(state, ctx, settings).map(|()| CallOutcome::SettingsUpdated)
        }
    }
}
