//! Auction lifecycle from first bid to final sweep.

use candle_module::queries::{bounty_snapshot, page_bids};
use candle_module::{AuctionError, CallOutcome, CandleCall};
use candle_proposer::{build_proposal, proposal_input, Watchtower, WatchtowerConfig};
use candle_types::{AuctionPhase, Settings};
use parking_lot::RwLock;
use rand::{rngs::StdRng, SeedableRng};

use crate::support::*;

#[test]
fn test_full_auction_lifecycle() {
    let mut chain = chain_with(Settings {
        max_winners: 8,
        ..settings()
    });
    let mut rng = StdRng::seed_from_u64(2024);

    // ========================================
    // Phase 1: Bidding
    // ========================================

    place_random_bids(&mut chain, &mut rng, 20);
    let bids = page_bids(&chain.module, 1, 0, 0);
    let pooled: u64 = bids.iter().map(|b| b.amount).sum();
    assert_eq!(chain.module.get_auction(1).unwrap().proceeds, pooled);

    // ========================================
    // Phase 2: Snuff and resolve the close
    // ========================================

    let request_id = snuff(&mut chain).unwrap();
    assert_eq!(chain.module.current_auction_id, 2);
    let offsets = chain.deliver_randomness().unwrap();
    assert_eq!(offsets.len(), 1);

    let auction = chain.module.get_auction(1).unwrap();
    let (earliest, latest) = auction.close_bounds();
    let close = auction.close_time().unwrap();
    assert!(earliest <= close && close <= latest);
    assert_eq!(auction.randomness_request, Some(request_id));

    // ========================================
    // Phase 3: Off-path proposal
    // ========================================

    let expected = build_proposal(&proposal_input(&chain.module, 1).unwrap()).unwrap();
    let shared = RwLock::new(chain);
    let mut tower = Watchtower::new(WatchtowerConfig {
        address: PROPOSER,
        ..Default::default()
    });
    tower.poll_once(&shared).unwrap();
    let mut chain = shared.into_inner();

    let proposal = chain.module.get_auction(1).unwrap().proposal.clone().unwrap();
    assert_eq!(proposal.commitment, expected.commitment);
    assert_eq!(proposal.total_bid_amount, expected.total_bid_amount);
    assert_eq!(proposal.winner_count as usize, expected.winners.len());

    // ========================================
    // Phase 4: Settlement
    // ========================================

    finalize(&mut chain);
    assert_eq!(
        chain.module.get_auction(1).unwrap().phase_at(chain.timestamp),
        AuctionPhase::Finalized
    );

    let encoding = expected.encoding.clone();
    for position in 0..expected.winners.len() as u32 {
        let outcome = chain
            .submit(
                [0x77; 32],
                0,
                CandleCall::ClaimWinningBid {
                    auction_id: 1,
                    encoding: encoding.clone(),
                    position,
                },
            )
            .unwrap();
        assert!(matches!(outcome, CallOutcome::ItemSettled { .. }));
    }
    let settled_to: Vec<_> = chain.settler.settled.iter().map(|(who, _, _)| *who).collect();
    let winners_by_bidder: Vec<_> = expected
        .winners
        .iter()
        .map(|&i| bids[i as usize].bidder)
        .collect();
    assert_eq!(settled_to, winners_by_bidder);

    let mut refunded = 0;
    for (index, bid) in bids.iter().enumerate() {
        if expected.winners.contains(&(index as u32)) {
            continue;
        }
        let outcome = chain
            .submit(
                bid.bidder,
                0,
                CandleCall::WithdrawBid {
                    auction_id: 1,
                    encoding: encoding.clone(),
                    index: index as u32,
                },
            )
            .unwrap();
        assert_eq!(outcome, CallOutcome::Paid { amount: bid.amount });
        assert_eq!(chain.module.get_balance(&bid.bidder), bid.amount);
        refunded += bid.amount;
    }
    assert_eq!(refunded + expected.total_bid_amount, pooled);

    let bounties = bounty_snapshot(&chain.module, 1).unwrap();
    chain
        .submit([0x77; 32], 0, CandleCall::ClaimSnuffBounty { auction_id: 1 })
        .unwrap();
    chain
        .submit([0x77; 32], 0, CandleCall::ClaimProposalBounty { auction_id: 1 })
        .unwrap();
    chain
        .submit([0x77; 32], 0, CandleCall::TransferProceeds { auction_id: 1 })
        .unwrap();

    assert_eq!(chain.module.get_balance(&SNUFFER), bounties.snuff);
    assert_eq!(chain.module.get_balance(&PROPOSER), bounties.proposal + DEPOSIT);
    assert_eq!(
        chain.module.get_balance(&BENEFICIARY),
        expected.total_bid_amount - bounties.total()
    );
    assert_eq!(chain.module.get_auction(1).unwrap().proceeds, 0);
    assert_eq!(chain.module.get_auction(1).unwrap().claimed_winners, 8);

    // the next round is already running with a fresh minimum bid
    let next = chain.module.get_auction(2).unwrap();
    assert_eq!(next.phase, AuctionPhase::Running);
    assert_eq!(next.start_time, START + 3 * DAY);
    assert_eq!(next.min_bid, MIN_BID);
}

#[test]
fn test_no_double_processing() {
    let mut chain = chain_with(Settings {
        max_winners: 1,
        ..settings()
    });
    place_bid(&mut chain, bidder(0), START + 10, 5_000_000).unwrap();
    place_bid(&mut chain, bidder(1), START + 20, 3_000_000).unwrap();
    snuff_and_resolve(&mut chain, ZERO_WORD);
    let (encoding, _) = propose(&mut chain, PROPOSER, &[0], 5_000_000).unwrap();
    finalize(&mut chain);

    let claim = CandleCall::ClaimWinningBid {
        auction_id: 1,
        encoding: encoding.clone(),
        position: 0,
    };
    chain.submit([0x77; 32], 0, claim.clone()).unwrap();
    assert_eq!(
        chain.submit([0x78; 32], 0, claim),
        Err(AuctionError::AlreadyProcessed(0))
    );
    assert_eq!(chain.settler.settled.len(), 1);

    let withdraw = CandleCall::WithdrawBid {
        auction_id: 1,
        encoding: encoding.clone(),
        index: 1,
    };
    chain.submit(bidder(1), 0, withdraw.clone()).unwrap();
    assert_eq!(
        chain.submit(bidder(1), 0, withdraw),
        Err(AuctionError::AlreadyProcessed(1))
    );
    assert_eq!(chain.module.get_balance(&bidder(1)), 3_000_000);

    // the winner can never withdraw
    assert_eq!(
        chain.submit(
            bidder(0),
            0,
            CandleCall::WithdrawBid {
                auction_id: 1,
                encoding,
                index: 0,
            }
        ),
        Err(AuctionError::WinnerCannotWithdraw(0))
    );
}

#[test]
fn test_auction_without_bids() {
    let mut chain = chain_with(settings());
    assert_eq!(snuff(&mut chain), None);

    let auction = chain.module.get_auction(1).unwrap();
    assert_eq!(auction.phase, AuctionPhase::EndedWithoutBids);
    assert!(chain.oracle.requests.is_empty());
    assert_eq!(chain.module.current_auction_id, 2);

    let result = chain.submit(
        PROPOSER,
        DEPOSIT,
        CandleCall::ProposeWinners {
            auction_id: 1,
            encoding: vec![],
            commitment: [0u8; 32],
            total_bid_amount: 0,
        },
    );
    assert_eq!(
        result,
        Err(AuctionError::InvalidState {
            expected: AuctionPhase::WaitingClose,
            got: AuctionPhase::EndedWithoutBids,
        })
    );
}

#[test]
fn test_sub_precision_bid_rejected() {
    let mut chain = chain_with(settings());
    assert!(matches!(
        place_bid(&mut chain, bidder(0), START + 1, MIN_BID + 1),
        Err(AuctionError::InvalidPrecision { .. })
    ));
    assert!(matches!(
        place_bid(&mut chain, bidder(0), START + 1, 1),
        Err(AuctionError::InvalidPrecision { .. })
    ));
    assert!(chain.module.get_bids(1).is_empty());
    assert!(chain.call_log.is_empty());
}

#[test]
fn test_same_block_proposals() {
    let mut chain = chain_with(Settings {
        max_winners: 2,
        ..settings()
    });
    place_bid(&mut chain, bidder(0), START + 10, 4_000_000).unwrap();
    place_bid(&mut chain, bidder(1), START + 20, 3_000_000).unwrap();
    snuff_and_resolve(&mut chain, ZERO_WORD);

    propose(&mut chain, PROPOSER, &[0, 1], 7_000_000).unwrap();
    let second = propose(&mut chain, CHALLENGER, &[0, 1], 7_000_000);
    assert_eq!(
        second,
        Err(AuctionError::InvalidState {
            expected: AuctionPhase::WaitingClose,
            got: AuctionPhase::WinnersProposed,
        })
    );
    let proposal = chain.module.get_auction(1).unwrap().proposal.clone().unwrap();
    assert_eq!(proposal.proposer, PROPOSER);
}

#[test]
fn test_increase_after_close_makes_bid_late() {
    let mut chain = chain_with(Settings {
        max_winners: 2,
        ..settings()
    });
    let a = place_bid(&mut chain, bidder(0), START + 3_600, 5_000_000).unwrap();
    place_bid(&mut chain, bidder(1), START + 7_200, 4_000_000).unwrap();
    place_bid(&mut chain, bidder(2), START + 10_800, 3_000_000).unwrap();

    // the close will resolve to 70% of the duration; raise past it
    chain.set_timestamp(START + 3 * DAY * 8 / 10);
    chain
        .submit(
            bidder(0),
            10_000_000,
            CandleCall::IncreaseBid {
                auction_id: 1,
                index: a,
                added_amount: 10_000_000,
            },
        )
        .unwrap();

    let close = snuff_and_resolve(&mut chain, ZERO_WORD);
    assert_eq!(u64::from(close), 3 * DAY * 7 / 10);

    let output = build_proposal(&proposal_input(&chain.module, 1).unwrap()).unwrap();
    assert_eq!(output.winners, vec![1, 2]);
    assert_eq!(output.total_bid_amount, 7_000_000);
}

#[test]
fn test_bidding_window() {
    let mut chain = chain_with(settings());
    assert_eq!(
        place_bid(&mut chain, bidder(0), START - 1, MIN_BID),
        Err(AuctionError::BiddingNotStarted)
    );
    assert!(matches!(
        place_bid(&mut chain, bidder(0), START + 5, MIN_BID - 1_000),
        Err(AuctionError::BidBelowMinimum { .. })
    ));
    assert_eq!(place_bid(&mut chain, bidder(0), START + 5, MIN_BID), Ok(0));
    assert_eq!(
        place_bid(&mut chain, bidder(1), START + 3 * DAY, MIN_BID),
        Err(AuctionError::BiddingEnded)
    );

    chain.set_timestamp(START + 3 * DAY - 1);
    assert!(matches!(
        chain.submit(SNUFFER, 0, CandleCall::Snuff { auction_id: 1 }),
        Err(AuctionError::CloseNotReached { .. })
    ));
}
