//! Canonical winner ranking.
//!
//! Bids are ordered by three keys:
//! - eligibility: bids placed before the close instant rank ahead of late bids
//! - amount, descending
//! - ledger index, ascending
//!
//! Late bids only ever fill slots left open when fewer than `max_winners`
//! eligible bids exist.

use std::cmp::Ordering;

use candle_types::Bid;

/// Result of winner computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerSet {
    /// Winning bid indices in canonical order
    pub indices: Vec<u32>,
    /// Sum of the winners' amounts
    pub total_bid_amount: u64,
    /// Number of bids placed before the close instant
    pub num_eligible: u32,
}

/// Compare two `(index, bid)` pairs by canonical rank.
///
/// `Ordering::Less` means `a` ranks ahead of `b`. The order is total: two
/// distinct indices never compare equal.
pub fn canonical_cmp(a: (u32, &Bid), b: (u32, &Bid), close_offset: u32) -> Ordering {
    let (a_index, a_bid) = a;
    let (b_index, b_bid) = b;
    b_bid
        .is_eligible(close_offset)
        .cmp(&a_bid.is_eligible(close_offset))
        .then_with(|| b_bid.amount.cmp(&a_bid.amount))
        .then_with(|| a_index.cmp(&b_index))
}

/// Number of winners a correct proposal names.
pub fn expected_winner_count(bid_count: usize, max_winners: u32) -> usize {
    bid_count.min(max_winners as usize)
}

/// Select the canonical winners.
///
/// Quickselect isolates the top `k`, then only those are sorted.
pub fn canonical_winners(bids: &[Bid], close_offset: u32, max_winners: u32) -> Vec<u32> {
    let k = expected_winner_count(bids.len(), max_winners);
    if k == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(u32, &Bid)> = bids
        .iter()
        .enumerate()
        .map(|(i, bid)| (i as u32, bid))
        .collect();

    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, |a, b| canonical_cmp(*a, *b, close_offset));
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(|a, b| canonical_cmp(*a, *b, close_offset));

    ranked.into_iter().map(|(i, _)| i).collect()
}

/// Compute the winner set with its aggregate values.
pub fn compute_winners(bids: &[Bid], close_offset: u32, max_winners: u32) -> WinnerSet {
    let indices = canonical_winners(bids, close_offset, max_winners);
    let total_bid_amount = indices
        .iter()
        .map(|&i| bids[i as usize].amount)
        .fold(0u64, u64::saturating_add);
    let num_eligible = bids.iter().filter(|b| b.is_eligible(close_offset)).count() as u32;

    WinnerSet {
        indices,
        total_bid_amount,
        num_eligible,
    }
}
