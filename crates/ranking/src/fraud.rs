//! Single counter-example fraud detection.
//!
//! A challenger resubmits the posted encoding plus one disputed bid index. The
//! checks below run in a fixed order and the first violation found is the
//! verdict. Together they are complete: a claimed list that passes every check
//! is the canonical winner list.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use candle_types::Bid;
use serde::{Deserialize, Serialize};

use crate::ranking::{canonical_cmp, expected_winner_count};

/// Why a proposal was found fraudulent.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum FraudReason {
    /// The same bid index appears twice
    DuplicateIndex,
    /// Count differs from `min(max_winners, bid_count)`
    IncorrectWinnerCount,
    /// An index points past the end of the ledger
    IndexOutOfRange,
    /// Two adjacent winners are not in canonical order
    IncorrectOrdering,
    /// A late winner displaced an eligible bid
    LateBidIncluded,
    /// An excluded bid outranks the lowest listed winner
    ExcludedHigherBid,
    /// Declared total differs from the winners' sum
    IncorrectTotal,
}

impl FraudReason {
    /// Stable numeric code for the reason.
    pub fn code(self) -> u8 {
        match self {
            FraudReason::DuplicateIndex => 1,
            FraudReason::IncorrectWinnerCount => 2,
            FraudReason::IndexOutOfRange => 3,
            FraudReason::IncorrectOrdering => 4,
            FraudReason::LateBidIncluded => 5,
            FraudReason::ExcludedHigherBid => 6,
            FraudReason::IncorrectTotal => 7,
        }
    }
}

impl fmt::Display for FraudReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FraudReason::DuplicateIndex => "duplicate index",
            FraudReason::IncorrectWinnerCount => "incorrect winner count",
            FraudReason::IndexOutOfRange => "index out of range",
            FraudReason::IncorrectOrdering => "incorrect ordering",
            FraudReason::LateBidIncluded => "late bid included",
            FraudReason::ExcludedHigherBid => "excluded higher bid",
            FraudReason::IncorrectTotal => "incorrect total",
        };
        f.write_str(text)
    }
}

/// Look for a deviation between a claimed winner list and the canonical result.
///
/// `disputed_index` only matters for the exclusion check; every other check is
/// decided by the claimed list alone.
pub fn find_fraud(
    bids: &[Bid],
    close_offset: u32,
    max_winners: u32,
    claimed: &[u32],
    declared_total: u64,
    disputed_index: u32,
) -> Option<FraudReason> {
    let mut seen = HashSet::with_capacity(claimed.len());
    if !claimed.iter().all(|index| seen.insert(*index)) {
        return Some(FraudReason::DuplicateIndex);
    }

    if claimed.len() != expected_winner_count(bids.len(), max_winners) {
        return Some(FraudReason::IncorrectWinnerCount);
    }

    if claimed.iter().any(|&index| index as usize >= bids.len()) {
        return Some(FraudReason::IndexOutOfRange);
    }

    let entry = |index: u32| (index, &bids[index as usize]);

    if claimed
        .windows(2)
        .any(|pair| canonical_cmp(entry(pair[0]), entry(pair[1]), close_offset) != Ordering::Less)
    {
        return Some(FraudReason::IncorrectOrdering);
    }

    // The list is sorted, so its last element is the lowest-ranked winner.
    if let (Some(&lowest), Some(disputed)) = (claimed.last(), bids.get(disputed_index as usize)) {
        if !seen.contains(&disputed_index)
            && canonical_cmp((disputed_index, disputed), entry(lowest), close_offset)
                == Ordering::Less
        {
            let lowest_bid = &bids[lowest as usize];
            let reason = if disputed.is_eligible(close_offset) && !lowest_bid.is_eligible(close_offset)
            {
                FraudReason::LateBidIncluded
            } else {
                FraudReason::ExcludedHigherBid
            };
            return Some(reason);
        }
    }

    let total = claimed
        .iter()
        .try_fold(0u64, |acc, &index| acc.checked_add(bids[index as usize].amount));
    if total != Some(declared_total) {
        return Some(FraudReason::IncorrectTotal);
    }

    None
}
