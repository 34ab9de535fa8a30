/// Durable storage for auctions, bids and bidder balances. The store is the
/// single source of truth: it alone arbitrates concurrent bids, via the
/// compare-and-commit check inside `commit_bid`.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod queries;

pub use memory::InMemoryAuctionStore;
pub use postgres::PostgresAuctionStore;
// endregion: --- Imports

// region:    --- Errors

/// Infrastructure and not-found failures. No partial mutation is ever
/// visible when one of these is returned.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("auction {0} not found")]
    AuctionNotFound(i64),

    #[error("bidder {0} not found")]
    BidderNotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Commit-time rejections, detected atomically with the write. The caller
/// should reload the auction before re-attempting.
#[derive(Debug, Error)]
pub enum CommitError {
    /// A concurrent bid was accepted between load and commit.
    #[error("auction price moved to {current}, expected {expected}")]
    StalePrice { expected: Decimal, current: Decimal },

    /// The auction ended (or was concluded) between load and commit.
    #[error("auction is no longer open for bids")]
    AuctionClosed,

    /// The bidder's authoritative balance no longer covers the bid.
    #[error("insufficient balance at commit time")]
    InsufficientFunds,

    #[error(transparent)]
    Store(#[from] StoreError),
}

// endregion: --- Errors

// region:    --- Auction Store Trait

#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Current auction snapshot, bids in acceptance order.
    async fn load_auction(&self, id: i64) -> Result<Auction, StoreError>;

    /// Bidder's remaining spendable balance.
    async fn load_bidder_balance(&self, bidder_id: i64) -> Result<Decimal, StoreError>;

    /// Atomically: re-check that the stored price still equals
    /// `expected_prior_price` and the auction is open, debit the bidder,
    /// credit back the superseded bidder, append the bid and apply the new
    /// price and end time. Applies nothing on failure. Returns the
    /// post-commit snapshot.
    async fn commit_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: Decimal,
        expected_prior_price: Decimal,
        new_end_time: DateTime<Utc>,
        placed_at: DateTime<Utc>,
    ) -> Result<Auction, CommitError>;

    /// Persist a new auction (`id == 0`, defaults already applied by the
    /// lifecycle service). Returns the persisted snapshot with its id set.
    async fn create_auction(&self, auction: &Auction) -> Result<Auction, StoreError>;

    /// Mark the auction ended. Idempotent.
    async fn conclude_auction(&self, id: i64) -> Result<(), StoreError>;

    /// Auctions matching the filter, newest listing first.
    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError>;
}

// endregion: --- Auction Store Trait
