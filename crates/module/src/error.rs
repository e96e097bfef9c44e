//! Auction module error types.

use thiserror::Error;

use candle_ranking::CodecError;
use candle_types::AuctionPhase;

use crate::external::ExternalError;

/// Errors that can occur in the auction module.
///
/// Every variant is a final rejection: nothing is applied and the caller has to
/// change the request before resubmitting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("Invalid state. Expected: {expected:?}, Got: {got:?}")]
    InvalidState {
        expected: AuctionPhase,
        got: AuctionPhase,
    },

    // === Bid ledger ===
    #[error("Bidding period not started")]
    BiddingNotStarted,

    #[error("Bidding period ended")]
    BiddingEnded,

    #[error("Bid below minimum: need {minimum}, got {got}")]
    BidBelowMinimum { minimum: u64, got: u64 },

    #[error("Amount {amount} is not a multiple of precision {precision}")]
    InvalidPrecision { amount: u64, precision: u64 },

    #[error("Attached value mismatch: expected {expected}, got {got}")]
    ValueMismatch { expected: u64, got: u64 },

    #[error("Bid ledger full")]
    LedgerFull,

    #[error("Bid timestamp out of range")]
    TimestampOverflow,

    #[error("Bid not found: {0}")]
    BidNotFound(u32),

    #[error("Caller does not own bid {0}")]
    NotBidOwner(u32),

    // === Close ===
    #[error("Close not reached: bidding runs until {deadline}")]
    CloseNotReached { deadline: u64 },

    #[error("Auction {0} is still settling")]
    SettlingSlotBusy(u64),

    #[error("Unknown randomness request: {0}")]
    UnknownRandomnessRequest(u64),

    #[error("Entropy already set")]
    EntropyAlreadySet,

    #[error("Caller is not the randomness oracle")]
    NotOracle,

    #[error("Entropy not yet available")]
    EntropyPending,

    // === Proposals and challenges ===
    #[error("Insufficient deposit: need {required}, got {got}")]
    InsufficientDeposit { required: u64, got: u64 },

    #[error("Commitment mismatch")]
    CommitmentMismatch,

    #[error("Invalid winners encoding: {0}")]
    InvalidEncoding(#[from] CodecError),

    #[error("Challenge period over")]
    ChallengePeriodOver,

    #[error("Proposer cannot challenge own proposal")]
    SelfChallenge,

    #[error("Challenge failed: no violation found")]
    ChallengeFailed,

    // === Settlement ===
    #[error("Bid {0} already processed")]
    AlreadyProcessed(u32),

    #[error("Position {position} out of range for {count} winners")]
    PositionOutOfRange { position: u32, count: u32 },

    #[error("Bid {0} is a winning bid")]
    WinnerCannotWithdraw(u32),

    #[error("Bounty already claimed")]
    BountyAlreadyClaimed,

    #[error("Proceeds already transferred")]
    FundsAlreadyMoved,

    #[error("Insolvent: need {required}, available {available}")]
    Insolvent { required: u64, available: u64 },

    #[error("Amount overflow")]
    AmountOverflow,

    // === Admin / collaborators ===
    #[error("Not authorized")]
    NotAuthorized,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("External collaborator failed: {0}")]
    External(#[from] ExternalError),
}
