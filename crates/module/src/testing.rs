//! Fixtures shared by the module's unit tests.

use crate::external::{MockItemSettler, MockRandomnessOracle};
use crate::genesis::CandleGenesisConfig;
use crate::handlers::{self, CallContext, HandlerResult};
use crate::state::AuctionState;
use candle_ranking::{commit_winners, compute_winners};
use candle_types::{Address, Hash32, IndexWidth, Settings};

pub const START: u64 = 10_000;
pub const GAS_PRICE: u64 = 2;
pub const SNUFF_GAS_PRICE: u64 = 4;
pub const SETTLEMENT_GAS: u64 = 150;
pub const DEPOSIT: u64 = 500;

/// Snuff lands on the nominal deadline; the proposal follows shortly after.
pub const SNUFFED_AT: u64 = START + 1_000;
pub const PROPOSED_AT: u64 = START + 1_100;
/// First instant after the fraud period of a proposal made at `PROPOSED_AT`.
pub const FINALIZED_AT: u64 = PROPOSED_AT + 101;

/// Resolves the close instant to the start of the snuff window (offset 700).
pub const ZERO_WORD: Hash32 = [0u8; 32];

pub const ADMIN: Address = [1u8; 32];
pub const BENEFICIARY: Address = [2u8; 32];
pub const ORACLE: Address = [3u8; 32];
pub const PROPOSER: Address = [0xAA; 32];
pub const CHALLENGER: Address = [0xBB; 32];
pub const SNUFFER: Address = [0xCC; 32];

pub fn test_settings() -> Settings {
    Settings {
        duration_secs: 1_000,
        snuff_percent: 30,
        max_winners: 3,
        index_width: IndexWidth::Two,
        deposit: DEPOSIT,
        bid_precision: 100,
        max_bounty_multiplier: 2,
        fraud_period_secs: 100,
        snuff_gas: 10,
        proposal_gas: 20,
    }
}

pub fn genesis_config() -> CandleGenesisConfig {
    CandleGenesisConfig {
        admin: ADMIN,
        beneficiary: BENEFICIARY,
        oracle: ORACLE,
        start_time: START,
        initial_gas_price: GAS_PRICE,
        settings: test_settings(),
    }
}

pub fn ctx(sender: Address, timestamp: u64, value: u64) -> CallContext {
    CallContext {
        sender,
        block_height: timestamp / 12,
        timestamp,
        value,
        gas_price: GAS_PRICE,
    }
}

/// Module state wired to mock collaborators.
pub struct Harness {
    pub state: AuctionState,
    pub settler: MockItemSettler,
    pub oracle: MockRandomnessOracle,
}

impl Harness {
    pub fn new() -> Self {
        let settler = MockItemSettler::new(SETTLEMENT_GAS);
        let state = handlers::handle_genesis(&genesis_config(), &settler).unwrap();
        Self {
            state,
            settler,
            oracle: MockRandomnessOracle::new(),
        }
    }

    /// Auction 1 with the given `(bidder byte, amount, offset)` bids, snuffed
    /// and resolved with `ZERO_WORD`.
    pub fn with_bids(bids: &[(u8, u64, u64)]) -> Self {
        let mut h = Self::new();
        for &(bidder, amount, offset) in bids {
            h.bid(bidder, amount, offset);
        }
        h.snuff();
        h.resolve(ZERO_WORD);
        h
    }

    pub fn bid(&mut self, bidder: u8, amount: u64, offset: u64) -> u32 {
        handlers::handle_place_bid(
            &mut self.state,
            &ctx([bidder; 32], START + offset, amount),
            1,
            amount,
        )
        .unwrap()
    }

    pub fn snuff(&mut self) -> u64 {
        let mut snuff_ctx = ctx(SNUFFER, SNUFFED_AT, 0);
        snuff_ctx.gas_price = SNUFF_GAS_PRICE;
        handlers::handle_snuff(&mut self.state, &snuff_ctx, 1, &mut self.oracle, &self.settler)
            .unwrap()
    }

    pub fn resolve(&mut self, word: Hash32) -> u32 {
        let request_id = self.oracle.last_request().unwrap();
        handlers::handle_fulfill_randomness(
            &mut self.state,
            &ctx(ORACLE, SNUFFED_AT, 0),
            request_id,
            word,
        )
        .unwrap()
    }

    pub fn canonical_indices(&self) -> Vec<u32> {
        let auction = self.state.get_auction(1).unwrap();
        compute_winners(
            self.state.get_bids(1),
            auction.close_offset.unwrap(),
            auction.settings.max_winners,
        )
        .indices
    }

    /// Canonical `(encoding, commitment, total)` for auction 1.
    pub fn canonical(&self) -> (Vec<u8>, Hash32, u64) {
        let auction = self.state.get_auction(1).unwrap();
        let winners = compute_winners(
            self.state.get_bids(1),
            auction.close_offset.unwrap(),
            auction.settings.max_winners,
        );
        let (encoding, commitment) = commit_winners(
            &winners.indices,
            auction.settings.index_width,
            &auction.entropy.unwrap(),
        )
        .unwrap();
        (encoding, commitment, winners.total_bid_amount)
    }

    pub fn propose(
        &mut self,
        proposer: Address,
        encoding: Vec<u8>,
        commitment: Hash32,
        total: u64,
    ) -> HandlerResult<()> {
        handlers::handle_propose_winners(
            &mut self.state,
            &ctx(proposer, PROPOSED_AT, DEPOSIT),
            1,
            &encoding,
            commitment,
            total,
        )
    }

    /// Propose the canonical result as `PROPOSER`.
    pub fn propose_canonical(&mut self) -> (Vec<u8>, Hash32) {
        let (encoding, commitment, total) = self.canonical();
        self.propose(PROPOSER, encoding.clone(), commitment, total)
            .unwrap();
        (encoding, commitment)
    }
}
