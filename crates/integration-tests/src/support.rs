//! Shared setup for the end-to-end tests.

use std::sync::Once;

use candle_module::{CandleCall, CandleGenesisConfig, HandlerResult};
use candle_proposer::MockChain;
use candle_ranking::commit_winners;
use candle_types::{Address, Hash32, IndexWidth, Settings};
use rand::{rngs::StdRng, Rng};
use tracing_subscriber::EnvFilter;

pub const START: u64 = 1_700_000_000;
pub const DAY: u64 = 86_400;
pub const GAS_PRICE: u64 = 20;
pub const SETTLEMENT_GAS: u64 = 100_000;
/// 20 gas price * 100_000 settlement gas
pub const MIN_BID: u64 = 2_000_000;
pub const DEPOSIT: u64 = 10_000_000;

pub const ADMIN: Address = [1u8; 32];
pub const BENEFICIARY: Address = [2u8; 32];
pub const ORACLE: Address = [3u8; 32];
pub const SNUFFER: Address = [0x5A; 32];
pub const PROPOSER: Address = [0xAA; 32];
pub const CHALLENGER: Address = [0xBB; 32];

/// Puts the close instant at the start of the snuff window.
pub const ZERO_WORD: Hash32 = [0u8; 32];

static TRACING: Once = Once::new();

/// Route module logs to the test writer. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Three days, 30% snuff window, 32 winners.
pub fn settings() -> Settings {
    Settings {
        duration_secs: 3 * DAY,
        snuff_percent: 30,
        max_winners: 32,
        index_width: IndexWidth::Two,
        deposit: DEPOSIT,
        bid_precision: 1_000,
        max_bounty_multiplier: 2,
        fraud_period_secs: 3_600,
        snuff_gas: 150_000,
        proposal_gas: 250_000,
    }
}

pub fn chain_with(settings: Settings) -> MockChain {
    init_tracing();
    let config = CandleGenesisConfig {
        admin: ADMIN,
        beneficiary: BENEFICIARY,
        oracle: ORACLE,
        start_time: START,
        initial_gas_price: GAS_PRICE,
        settings,
    };
    MockChain::genesis(&config, SETTLEMENT_GAS).unwrap()
}

pub fn bidder(i: usize) -> Address {
    let mut address = [0xB0u8; 32];
    address[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
    address
}

pub fn place_bid(chain: &mut MockChain, who: Address, at: u64, amount: u64) -> HandlerResult<u32> {
    chain.set_timestamp(at);
    let auction_id = chain.module.current_auction_id;
    let outcome = chain.submit(who, amount, CandleCall::PlaceBid { auction_id, amount })?;
    match outcome {
        candle_module::CallOutcome::BidPlaced { index } => Ok(index),
        other => panic!("unexpected outcome {other:?}"),
    }
}

/// Place `count` bids from distinct bidders at random, increasing times over
/// the whole bidding period.
pub fn place_random_bids(chain: &mut MockChain, rng: &mut StdRng, count: usize) {
    let duration = chain.module.settings.duration_secs;
    let mut offsets: Vec<u64> = (0..count).map(|_| rng.gen_range(0..duration)).collect();
    offsets.sort_unstable();
    for (i, offset) in offsets.into_iter().enumerate() {
        let amount = MIN_BID + rng.gen_range(0..5_000u64) * 1_000;
        place_bid(chain, bidder(i), START + offset, amount).unwrap();
    }
}

/// Snuff auction 1 at its deadline. Returns the oracle request id.
pub fn snuff(chain: &mut MockChain) -> Option<u64> {
    let deadline = chain.module.get_auction(1).unwrap().bidding_deadline();
    chain.set_timestamp(deadline);
    chain
        .submit(SNUFFER, 0, CandleCall::Snuff { auction_id: 1 })
        .unwrap();
    chain.module.get_auction(1).unwrap().randomness_request
}

/// Snuff auction 1 and answer the oracle request with `word`.
pub fn snuff_and_resolve(chain: &mut MockChain, word: Hash32) -> u32 {
    let request_id = snuff(chain).unwrap();
    chain
        .submit(
            ORACLE,
            0,
            CandleCall::FulfillRandomness {
                request_id,
                random_word: word,
            },
        )
        .unwrap();
    chain.module.get_auction(1).unwrap().close_offset.unwrap()
}

/// Post a proposal for auction 1 built from an arbitrary index list.
pub fn propose(
    chain: &mut MockChain,
    proposer: Address,
    indices: &[u32],
    total_bid_amount: u64,
) -> HandlerResult<(Vec<u8>, Hash32)> {
    let auction = chain.module.get_auction(1).unwrap();
    let (encoding, commitment) = commit_winners(
        indices,
        auction.settings.index_width,
        &auction.entropy.unwrap(),
    )?;
    let deposit = auction.settings.deposit;
    chain.submit(
        proposer,
        deposit,
        CandleCall::ProposeWinners {
            auction_id: 1,
            encoding: encoding.clone(),
            commitment,
            total_bid_amount,
        },
    )?;
    Ok((encoding, commitment))
}

/// Move past the fraud period of auction 1's live proposal.
pub fn finalize(chain: &mut MockChain) {
    let deadline = chain
        .module
        .get_auction(1)
        .unwrap()
        .challenge_deadline()
        .unwrap();
    chain.set_timestamp(deadline + 1);
}
