//! End-to-end integration tests for optimistic candle auctions.
//!
//! These tests drive the module through the in-process chain:
//! 1. Bidding on a running auction
//! 2. Snuffing and resolving the close instant
//! 3. Proposing winners off-path
//! 4. Challenging wrong proposals with single counter-examples
//! 5. Settling items, refunds, bounties and proceeds

#[cfg(test)]
mod support;

#[cfg(test)]
mod lifecycle;
