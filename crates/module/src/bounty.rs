//! Bounty sizing.
//!
//! Bounties are paid out of auction proceeds, never out of protocol funds. They
//! come only from the excess over what `max_winners` minimum bids would raise,
//! so settling the items always takes priority over paying bounties.

use candle_types::Settings;
use serde::{Deserialize, Serialize};

/// Bounties fixed at proposal time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounties {
    pub snuff: u64,
    pub proposal: u64,
}

impl Bounties {
    pub fn total(&self) -> u64 {
        self.snuff + self.proposal
    }
}

/// Size the snuff and proposal bounties for a realized total bid amount.
///
/// Each bounty is capped by its gas-cost target (`gas × gas_price ×
/// max_bounty_multiplier`); the snuff bounty may take at most half the excess
/// and the proposal bounty at most what remains.
pub fn compute_bounties(
    settings: &Settings,
    min_bid: u64,
    gas_price: u64,
    total_bid_amount: u64,
) -> Bounties {
    let floor = u64::from(settings.max_winners).saturating_mul(min_bid);
    let excess = total_bid_amount.saturating_sub(floor);
    if excess == 0 {
        return Bounties::default();
    }

    let target = |gas: u64| {
        gas.saturating_mul(gas_price)
            .saturating_mul(settings.max_bounty_multiplier)
    };

    let snuff = target(settings.snuff_gas).min(excess / 2);
    let proposal = target(settings.proposal_gas).min(excess - snuff);

    Bounties { snuff, proposal }
}
