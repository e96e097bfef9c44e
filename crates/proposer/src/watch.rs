//! Counter-example search over posted proposals.

use candle_ranking::{canonical_winners, find_fraud, FraudReason};
use candle_types::Bid;

/// One disputed bid and the fraud it demonstrates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterExample {
    pub disputed_index: u32,
    pub reason: FraudReason,
}

/// Find a counter-example against a claimed winner list, if it is wrong.
///
/// The disputed index is the first canonical winner the claim leaves out.
/// A sorted claim of the right size that differs from the canonical list
/// always leaves one out, and that bid outranks the claim's lowest entry.
pub fn find_counter_example(
    bids: &[Bid],
    close_offset: u32,
    max_winners: u32,
    claimed: &[u32],
    declared_total: u64,
) -> Option<CounterExample> {
    let canonical = canonical_winners(bids, close_offset, max_winners);
    let disputed_index = canonical
        .iter()
        .copied()
        .find(|index| !claimed.contains(index))
        .unwrap_or(0);

    find_fraud(
        bids,
        close_offset,
        max_winners,
        claimed,
        declared_total,
        disputed_index,
    )
    .map(|reason| CounterExample {
        disputed_index,
        reason,
    })
}
