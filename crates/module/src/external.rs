//! External collaborators: item settlement and the randomness oracle.
//!
//! The module only depends on these traits. Deployments plug in their own
//! implementations; the mocks below are deterministic and used by tests and
//! local simulations.

use candle_types::{Address, Hash32};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Failures reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalError {
    #[error("Settlement failed: {0}")]
    SettlementFailed(String),

    #[error("Randomness request failed: {0}")]
    RequestFailed(String),
}

/// Settles the auctioned item for one winning bid.
pub trait ItemSettler {
    /// Hand the item to `winner`, seeded with per-bid entropy. Returns the item id.
    fn settle(&mut self, winner: &Address, seed: &Hash32) -> Result<u64, ExternalError>;

    /// Gas consumed by one `settle` call, used to size the minimum bid.
    fn estimated_settlement_gas(&self) -> u64;
}

/// Asynchronous source of unpredictable entropy.
///
/// The answer arrives later through the `FulfillRandomness` call.
pub trait RandomnessOracle {
    /// Request a random word. Returns the request id the callback will carry.
    fn request(&mut self, seed: &Hash32) -> Result<u64, ExternalError>;
}

/// Collaborators handed to the call dispatcher.
pub struct Collaborators<'a> {
    pub settler: &'a mut dyn ItemSettler,
    pub oracle: &'a mut dyn RandomnessOracle,
}

/// In-memory settler recording every settlement.
#[derive(Debug, Default)]
pub struct MockItemSettler {
    pub settlement_gas: u64,
    /// (winner, seed, item id)
    pub settled: Vec<(Address, Hash32, u64)>,
    /// Fail every settlement when set
    pub fail: bool,
    next_item_id: u64,
}

impl MockItemSettler {
    pub fn new(settlement_gas: u64) -> Self {
        Self {
            settlement_gas,
            ..Default::default()
        }
    }
}

impl ItemSettler for MockItemSettler {
    fn settle(&mut self, winner: &Address, seed: &Hash32) -> Result<u64, ExternalError> {
        if self.fail {
            return Err(ExternalError::SettlementFailed("mock settler disabled".into()));
        }
        self.next_item_id += 1;
        self.settled.push((*winner, *seed, self.next_item_id));
        Ok(self.next_item_id)
    }

    fn estimated_settlement_gas(&self) -> u64 {
        self.settlement_gas
    }
}

/// In-memory oracle handing out sequential request ids.
#[derive(Debug, Default)]
pub struct MockRandomnessOracle {
    /// (request id, seed)
    pub requests: Vec<(u64, Hash32)>,
    next_request_id: u64,
}

impl MockRandomnessOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the most recent request.
    pub fn last_request(&self) -> Option<u64> {
        self.requests.last().map(|(id, _)| *id)
    }

    /// Deterministic word the mock would deliver for a request.
    pub fn word_for(&self, request_id: u64) -> Option<Hash32> {
        let (_, seed) = self.requests.iter().find(|(id, _)| *id == request_id)?;
        let mut hasher = Sha256::new();
        hasher.update(b"MOCK_RANDOM_WORD:");
        hasher.update(seed);
        hasher.update(request_id.to_le_bytes());
        Some(hasher.finalize().into())
    }
}

impl RandomnessOracle for MockRandomnessOracle {
    fn request(&mut self, seed: &Hash32) -> Result<u64, ExternalError> {
        self.next_request_id += 1;
        self.requests.push((self.next_request_id, *seed));
        Ok(self.next_request_id)
    }
}
