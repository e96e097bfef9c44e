//! Watchtower service implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use candle_module::queries::{get_awaiting_proposal, get_challengeable, required_deposit};
use candle_module::CandleCall;
use candle_ranking::{commitment_hash, decode, FraudReason};
use candle_types::{Address, Hash32};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::chain::MockChain;
use crate::proposal::{build_proposal, proposal_input};
use crate::watch::{find_counter_example, CounterExample};

/// Configuration for the watchtower.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchtowerConfig {
    /// Address proposals and challenges are sent from
    #[serde_as(as = "Hex")]
    pub address: Address,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Post proposals for auctions awaiting one
    pub propose: bool,
    /// Challenge wrong proposals posted by others
    pub challenge: bool,
}

impl Default for WatchtowerConfig {
    fn default() -> Self {
        Self {
            address: [0xEE; 32],
            poll_interval_ms: 1_000,
            propose: true,
            challenge: true,
        }
    }
}

impl WatchtowerConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Something the watchtower did during a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    Proposed {
        auction_id: u64,
        commitment: Hash32,
        winners: usize,
    },
    Challenged {
        auction_id: u64,
        disputed_index: u32,
        reason: FraudReason,
    },
}

/// Running totals over the watchtower's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub polls: u64,
    pub proposed: u64,
    pub challenged: u64,
}

impl WatchStats {
    fn record(&mut self, action: &WatchAction) {
        match action {
            WatchAction::Proposed { .. } => self.proposed += 1,
            WatchAction::Challenged { .. } => self.challenged += 1,
        }
    }
}

struct Dispute {
    auction_id: u64,
    encoding: Vec<u8>,
    claimed_hash: Hash32,
    example: CounterExample,
}

/// The watchtower.
pub struct Watchtower {
    config: WatchtowerConfig,
    stats: WatchStats,
    /// Proposals already checked and found correct, by commitment
    cleared: HashSet<Hash32>,
}

impl Watchtower {
    /// Create a new watchtower.
    pub fn new(config: WatchtowerConfig) -> Self {
        Self {
            config,
            stats: WatchStats::default(),
            cleared: HashSet::new(),
        }
    }

    pub fn config(&self) -> &WatchtowerConfig {
        &self.config
    }

    pub fn stats(&self) -> WatchStats {
        self.stats
    }

    /// Propose for every auction awaiting a proposal, then challenge every
    /// wrong proposal still inside its fraud period.
    pub fn poll_once(&mut self, chain: &RwLock<MockChain>) -> Result<Vec<WatchAction>> {
        let mut actions = Vec::new();

        if self.config.propose {
            let inputs = {
                let chain = chain.read();
                get_awaiting_proposal(&chain.module)
                    .into_iter()
                    .map(|auction_id| proposal_input(&chain.module, auction_id))
                    .collect::<Result<Vec<_>>>()?
            };

            for input in inputs {
                let output = build_proposal(&input)?;
                let mut chain = chain.write();
                let deposit = required_deposit(&chain.module, output.auction_id).unwrap_or(0);
                let call = CandleCall::ProposeWinners {
                    auction_id: output.auction_id,
                    encoding: output.encoding.clone(),
                    commitment: output.commitment,
                    total_bid_amount: output.total_bid_amount,
                };
                match chain.submit(self.config.address, deposit, call) {
                    Ok(_) => {
                        info!(
                            auction_id = output.auction_id,
                            commitment = %hex::encode(output.commitment),
                            winners = output.winners.len(),
                            "proposal submitted"
                        );
                        self.cleared.insert(output.commitment);
                        actions.push(WatchAction::Proposed {
                            auction_id: output.auction_id,
                            commitment: output.commitment,
                            winners: output.winners.len(),
                        });
                    }
                    Err(err) => {
                        debug!(auction_id = output.auction_id, %err, "proposal not accepted")
                    }
                }
            }
        }

        if self.config.challenge {
            let disputes = {
                let chain = chain.read();
                get_challengeable(&chain.module, chain.timestamp)
                    .into_iter()
                    .filter_map(|auction_id| self.inspect(&chain, auction_id))
                    .collect::<Vec<_>>()
            };

            for dispute in disputes {
                let call = CandleCall::Challenge {
                    auction_id: dispute.auction_id,
                    encoding: dispute.encoding,
                    claimed_hash: dispute.claimed_hash,
                    disputed_index: dispute.example.disputed_index,
                };
                match chain.write().submit(self.config.address, 0, call) {
                    Ok(_) => {
                        warn!(
                            auction_id = dispute.auction_id,
                            reason = %dispute.example.reason,
                            disputed_index = dispute.example.disputed_index,
                            "fraudulent proposal challenged"
                        );
                        actions.push(WatchAction::Challenged {
                            auction_id: dispute.auction_id,
                            disputed_index: dispute.example.disputed_index,
                            reason: dispute.example.reason,
                        });
                    }
                    Err(err) => warn!(auction_id = dispute.auction_id, %err, "challenge rejected"),
                }
            }
        }

        self.stats.polls += 1;
        for action in &actions {
            self.stats.record(action);
        }
        Ok(actions)
    }

    /// Check the live proposal of one auction against the ledger.
    fn inspect(&mut self, chain: &MockChain, auction_id: u64) -> Option<Dispute> {
        let auction = chain.module.get_auction(auction_id)?;
        let proposal = auction.proposal.as_ref()?;
        if proposal.proposer == self.config.address || self.cleared.contains(&proposal.commitment)
        {
            return None;
        }

        let encoding = chain.posted_encoding(auction_id)?;
        let entropy = auction.entropy?;
        let close_offset = auction.close_offset?;
        let claimed_hash = commitment_hash(encoding, &entropy);
        if claimed_hash != proposal.commitment {
            debug!(auction_id, "logged encoding does not match live commitment");
            return None;
        }

        let claimed = decode(encoding, auction.settings.index_width).ok()?;
        let Some(example) = find_counter_example(
            chain.module.get_bids(auction_id),
            close_offset,
            auction.settings.max_winners,
            &claimed,
            proposal.total_bid_amount,
        ) else {
            self.cleared.insert(proposal.commitment);
            return None;
        };

        Some(Dispute {
            auction_id,
            encoding: encoding.to_vec(),
            claimed_hash,
            example,
        })
    }

    /// Poll until `shutdown` fires. Returns the lifetime stats.
    pub async fn run(
        mut self,
        chain: Arc<RwLock<MockChain>>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<WatchStats> {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        info!(
            address = %hex::encode(self.config.address),
            poll_interval_ms = self.config.poll_interval_ms,
            "watchtower started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_once(&chain) {
                        warn!(%err, "watchtower poll failed");
                    }
                }
            }
        }

        info!(
            polls = self.stats.polls,
            proposed = self.stats.proposed,
            challenged = self.stats.challenged,
            "watchtower stopped"
        );
        Ok(self.stats)
    }
}
