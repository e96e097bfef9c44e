//! Optimistic candle auction module.
//!
//! This module implements the on-chain side of a candle auction:
//!
//! - An append-only bid ledger with a randomized, retroactively revealed close
//! - A phase machine driving each round from bidding to settlement
//! - Optimistic winner determination: a bonded proposer commits to the winner
//!   list off-chain and anyone may overturn it with one counter-example
//! - Pull-payment settlement of items, refunds, bounties and proceeds
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `challenge`: Counter-example verification
//! - `bounty`: Snuff and proposal bounty sizing
//! - `external`: Item settler and randomness oracle seams
//! - `queries`: Read-only state access
//! - `state`: Module state structures
//! - `genesis`: Initial configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use candle_module::{handlers, external::MockItemSettler, CandleGenesisConfig};
//!
//! let settler = MockItemSettler::new(150_000);
//! let mut state = handlers::handle_genesis(&CandleGenesisConfig::default(), &settler)?;
//! let ctx = handlers::CallContext { ... };
//!
//! // Place a bid on the running auction
//! let index = handlers::handle_place_bid(&mut state, &ctx, state.current_auction_id, amount)?;
//! ```

pub mod bounty;
pub mod call;
pub mod challenge;
pub mod error;
pub mod external;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod state;

#[cfg(test)]
mod testing;

pub use bounty::{compute_bounties, Bounties};
pub use call::{CallOutcome, CandleCall};
pub use error::AuctionError;
pub use external::{Collaborators, ExternalError, ItemSettler, RandomnessOracle};
pub use genesis::{CandleGenesisConfig, GenesisValidationError};
pub use handlers::{CallContext, HandlerResult};
pub use queries::{AuctionQuery, AuctionQueryResponse};
pub use state::AuctionState;
