/// Bid placement orchestration
/// validate -> extend -> atomic store commit -> event fanout
// region:    --- Imports
use crate::auction::events::{AuctionEvent, EventPublisher};
use crate::auction::model::Auction;
use crate::bidding::anti_snipe::maybe_extend;
use crate::bidding::validate::{validate_bid, BidRejection};
use crate::store::{AuctionStore, CommitError, StoreError};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Bid Error

/// Everything that can stop a bid, split along the error taxonomy:
/// validation, commit-time conflict, infrastructure.
#[derive(Debug, Error)]
pub enum BidError {
    #[error(transparent)]
    Rejected(#[from] BidRejection),

    #[error("store rejected the bid: {0}")]
    RejectedByStore(CommitError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// endregion: --- Bid Error

// region:    --- Bidding Engine

/// Orchestrates bid placement against a store. The engine never treats its
/// loaded snapshot as authoritative: the store re-checks every precondition
/// atomically with the write, and a conflict is returned to the caller
/// rather than retried here. A caller whose request timed out must reload
/// the auction before resubmitting; a timeout does not mean the commit
/// missed.
pub struct AuctionBiddingEngine<S: AuctionStore> {
    store: Arc<S>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl<S: AuctionStore> AuctionBiddingEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            publisher: None,
        }
    }

    pub fn with_publisher(store: Arc<S>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            publisher: Some(publisher),
        }
    }

    /// Place a bid. On success the returned auction is the store's
    /// post-commit snapshot; on any error no state change is visible.
    pub async fn place_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: Decimal,
    ) -> Result<Auction, BidError> {
        info!(
            "{:<12} --> bid request: auction {}, bidder {}, amount {}",
            "Engine", auction_id, bidder_id, amount
        );

        let auction = self.store.load_auction(auction_id).await?;
        let balance = self.store.load_bidder_balance(bidder_id).await?;
        let now = Utc::now();

        validate_bid(&auction, bidder_id, balance, amount, now)?;

        let new_end_time = maybe_extend(&auction, now);

        let committed = self
            .store
            .commit_bid(
                auction_id,
                bidder_id,
                amount,
                auction.current_price,
                new_end_time,
                now,
            )
            .await
            .map_err(|e| match e {
                CommitError::Store(store_error) => BidError::Store(store_error),
                conflict => BidError::RejectedByStore(conflict),
            })?;

        info!(
            "{:<12} --> bid accepted: auction {} at {}, closes {}",
            "Engine", auction_id, committed.current_price, committed.end_time
        );

        self.publish(AuctionEvent::BidAccepted {
            auction_id,
            bidder_id,
            amount,
            new_end_time: committed.end_time,
            timestamp: now,
        })
        .await;

        Ok(committed)
    }

    async fn publish(&self, event: AuctionEvent) {
        if let Some(publisher) = &self.publisher {
            if let Err(e) = publisher.publish(&event).await {
                warn!("{:<12} --> event publish failed: {}", "Engine", e);
            }
        }
    }
}

// endregion: --- Bidding Engine
