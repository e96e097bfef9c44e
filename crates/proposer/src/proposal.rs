//! Off-path winner computation.

use anyhow::{anyhow, Result};
use candle_module::AuctionState;
use candle_ranking::{commit_winners, compute_winners};
use candle_types::proposal_io::{ProposalInput, ProposalOutput};

/// Compute the canonical winners for an auction and pack them for submission.
///
/// This function:
/// 1. Validates the snapshot
/// 2. Ranks the full ledger against the resolved close instant
/// 3. Packs the winners and commits to them with the round entropy
pub fn build_proposal(input: &ProposalInput) -> Result<ProposalOutput> {
    input.validate().map_err(|e| anyhow!(e))?;

    let winners = compute_winners(&input.bids, input.close_offset, input.max_winners);
    let (encoding, commitment) =
        commit_winners(&winners.indices, input.index_width, &input.entropy)?;

    Ok(ProposalOutput {
        auction_id: input.auction_id,
        winners: winners.indices,
        encoding,
        commitment,
        total_bid_amount: winners.total_bid_amount,
    })
}

/// Snapshot what `build_proposal` needs from the module state.
pub fn proposal_input(state: &AuctionState, auction_id: u64) -> Result<ProposalInput> {
    let auction = state
        .get_auction(auction_id)
        .ok_or_else(|| anyhow!("auction {auction_id} not found"))?;
    let (Some(entropy), Some(close_offset)) = (auction.entropy, auction.close_offset) else {
        anyhow::bail!("auction {auction_id} has no resolved close yet");
    };

    Ok(ProposalInput {
        auction_id,
        bids: state.get_bids(auction_id).to_vec(),
        close_offset,
        entropy,
        max_winners: auction.settings.max_winners,
        index_width: auction.settings.index_width,
    })
}
