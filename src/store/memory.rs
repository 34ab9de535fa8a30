// region:    --- Imports
use crate::auction::model::{Auction, AuctionFilter, AuctionStatus, Bid};
use crate::store::{AuctionStore, CommitError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
// endregion: --- Imports

// region:    --- In-Memory Auction Store

/// Mutex-serialized store with the same commit semantics as the Postgres
/// implementation. Backs the test suite and local runs without a database.
#[derive(Default)]
pub struct InMemoryAuctionStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    auctions: HashMap<i64, Auction>,
    balances: HashMap<i64, Decimal>,
    next_auction_id: i64,
    next_bid_id: i64,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bidder with an opening balance. Returns the bidder id.
    pub fn register_bidder(&self, balance: Decimal) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.balances.len() as i64 + 1;
        state.balances.insert(id, balance);
        id
    }

    /// Overwrite a bidder's balance.
    pub fn set_balance(&self, bidder_id: i64, balance: Decimal) {
        let mut state = self.state.lock().unwrap();
        state.balances.insert(bidder_id, balance);
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn load_auction(&self, id: i64) -> Result<Auction, StoreError> {
        let state = self.state.lock().unwrap();
        state
            .auctions
            .get(&id)
            .cloned()
            .ok_or(StoreError::AuctionNotFound(id))
    }

    async fn load_bidder_balance(&self, bidder_id: i64) -> Result<Decimal, StoreError> {
        let state = self.state.lock().unwrap();
        state
            .balances
            .get(&bidder_id)
            .copied()
            .ok_or(StoreError::BidderNotFound(bidder_id))
    }

    async fn commit_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: Decimal,
        expected_prior_price: Decimal,
        new_end_time: DateTime<Utc>,
        placed_at: DateTime<Utc>,
    ) -> Result<Auction, CommitError> {
        let mut state = self.state.lock().unwrap();

        if !state.balances.contains_key(&bidder_id) {
            return Err(CommitError::Store(StoreError::BidderNotFound(bidder_id)));
        }

        let auction = state
            .auctions
            .get(&auction_id)
            .ok_or(CommitError::Store(StoreError::AuctionNotFound(auction_id)))?;

        // Re-check the preconditions against authoritative state; the lock
        // makes the whole commit one serialization point per store.
        if auction.current_price != expected_prior_price {
            return Err(CommitError::StalePrice {
                expected: expected_prior_price,
                current: auction.current_price,
            });
        }
        if auction.status == AuctionStatus::Ended
            || placed_at < auction.start_time
            || placed_at >= auction.end_time
        {
            return Err(CommitError::AuctionClosed);
        }

        let refund = auction.highest_bid().map(|bid| (bid.bidder_id, bid.amount));
        let mut available = state.balances[&bidder_id];
        if let Some((previous_bidder, previous_amount)) = refund {
            // A bidder raising their own bid gets the old escrow back first.
            if previous_bidder == bidder_id {
                available += previous_amount;
            }
        }
        if available < amount {
            return Err(CommitError::InsufficientFunds);
        }

        if let Some((previous_bidder, previous_amount)) = refund {
            *state.balances.entry(previous_bidder).or_insert(Decimal::ZERO) += previous_amount;
        }
        *state.balances.entry(bidder_id).or_insert(Decimal::ZERO) -= amount;

        state.next_bid_id += 1;
        let bid_id = state.next_bid_id;
        let auction = state.auctions.get_mut(&auction_id).unwrap();
        auction.bids.push(Bid {
            id: bid_id,
            auction_id,
            bidder_id,
            amount,
            placed_at,
        });
        auction.current_price = amount;
        auction.end_time = new_end_time;
        auction.status = AuctionStatus::Active;

        Ok(auction.clone())
    }

    async fn create_auction(&self, auction: &Auction) -> Result<Auction, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_auction_id += 1;
        let mut auction = auction.clone();
        auction.id = state.next_auction_id;
        state.auctions.insert(auction.id, auction.clone());
        Ok(auction)
    }

    async fn conclude_auction(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let auction = state
            .auctions
            .get_mut(&id)
            .ok_or(StoreError::AuctionNotFound(id))?;
        auction.status = AuctionStatus::Ended;
        Ok(())
    }

    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut auctions: Vec<Auction> = state
            .auctions
            .values()
            .filter(|auction| filter.matches(auction))
            .cloned()
            .collect();
        auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(auctions)
    }
}

// endregion: --- In-Memory Auction Store
