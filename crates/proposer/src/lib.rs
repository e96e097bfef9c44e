//! Permissionless proposer and watchtower for optimistic candle auctions.
//!
//! The service:
//! 1. Monitors auctions whose close instant has resolved
//! 2. Recomputes the canonical winner list from the full bid ledger
//! 3. Packs and commits to it, then posts a bonded proposal
//! 4. Re-checks every proposal posted by others during its fraud period
//! 5. Submits a single counter-example when one is wrong
//!
//! Anyone can run this service. Proposing earns the proposal bounty; catching
//! a fraudulent proposal earns the proposer's deposit.

pub mod chain;
pub mod proposal;
pub mod service;
pub mod watch;

pub use chain::MockChain;
pub use proposal::{build_proposal, proposal_input};
pub use service::{WatchAction, WatchStats, Watchtower, WatchtowerConfig};
pub use watch::{find_counter_example, CounterExample};
