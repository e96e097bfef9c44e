//! In-process chain hosting the auction module for local runs and tests.
//!
//! Calls go through the module dispatcher against mock collaborators, and
//! every accepted call is appended to a log the watchtower reads proposal
//! payloads from.

use candle_module::external::{MockItemSettler, MockRandomnessOracle};
use candle_module::{
    handlers, AuctionState, CallContext, CallOutcome, CandleCall, CandleGenesisConfig, Collaborators,
    HandlerResult,
};
use candle_types::{Address, AuctionPhase};

/// Simulated chain state.
pub struct MockChain {
    /// Module state
    pub module: AuctionState,
    /// Item settlement backend
    pub settler: MockItemSettler,
    /// Randomness backend
    pub oracle: MockRandomnessOracle,
    /// Current block height (simulated)
    pub block_height: u64,
    /// Current timestamp (simulated, can be advanced)
    pub timestamp: u64,
    /// Gas price attached to submitted calls
    pub gas_price: u64,
    /// Accepted calls in execution order
    pub call_log: Vec<(Address, CandleCall)>,
}

impl MockChain {
    /// Start a chain from genesis at the first auction's start time.
    pub fn genesis(config: &CandleGenesisConfig, settlement_gas: u64) -> HandlerResult<Self> {
        let settler = MockItemSettler::new(settlement_gas);
        let module = handlers::handle_genesis(config, &settler)?;
        Ok(Self {
            module,
            settler,
            oracle: MockRandomnessOracle::new(),
            block_height: 0,
            timestamp: config.start_time,
            gas_price: config.initial_gas_price,
            call_log: Vec::new(),
        })
    }

    pub fn advance_block(&mut self) {
        self.block_height += 1;
        self.timestamp += 12; // ~12 second blocks
    }

    pub fn set_timestamp(&mut self, ts: u64) {
        self.timestamp = ts;
    }

    /// Execute a call at the current block.
    pub fn submit(
        &mut self,
        sender: Address,
        value: u64,
        call: CandleCall,
    ) -> HandlerResult<CallOutcome> {
        let ctx = CallContext {
            sender,
            block_height: self.block_height,
            timestamp: self.timestamp,
            value,
            gas_price: self.gas_price,
        };
        let mut collaborators = Collaborators {
            settler: &mut self.settler,
            oracle: &mut self.oracle,
        };
        let outcome = handlers::dispatch(&mut self.module, &ctx, call.clone(), &mut collaborators)?;
        self.call_log.push((sender, call));
        Ok(outcome)
    }

    /// Answer every randomness request still waiting for its word.
    pub fn deliver_randomness(&mut self) -> HandlerResult<Vec<u32>> {
        let mut pending: Vec<u64> = self
            .module
            .randomness_requests
            .iter()
            .filter(|(_, auction_id)| {
                self.module.get_auction(**auction_id).is_some_and(|auction| {
                    auction.phase == AuctionPhase::WaitingClose && auction.entropy.is_none()
                })
            })
            .map(|(request_id, _)| *request_id)
            .collect();
        pending.sort_unstable();

        let oracle = self.module.oracle;
        let mut offsets = Vec::with_capacity(pending.len());
        for request_id in pending {
            let Some(random_word) = self.oracle.word_for(request_id) else {
                continue;
            };
            let call = CandleCall::FulfillRandomness {
                request_id,
                random_word,
            };
            if let CallOutcome::CloseResolved { close_offset } = self.submit(oracle, 0, call)? {
                offsets.push(close_offset);
            }
        }
        Ok(offsets)
    }

    /// Encoding carried by the most recent accepted proposal for an auction.
    pub fn posted_encoding(&self, auction_id: u64) -> Option<&[u8]> {
        self.call_log.iter().rev().find_map(|(_, call)| match call {
            CandleCall::ProposeWinners {
                auction_id: id,
                encoding,
                ..
            } if *id == auction_id => Some(encoding.as_slice()),
            _ => None,
        })
    }
}
