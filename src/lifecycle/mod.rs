/// Listing lifecycle operations
/// 1. create listing (defaults applied)
/// 2. conclude auction
/// 3. countdown and listing queries
// region:    --- Imports
use crate::auction::events::{AuctionEvent, EventPublisher};
use crate::auction::model::{
    Auction, AuctionFilter, AuctionSort, AuctionStatus, ListingDraft, ListingKind, SortField,
};
use crate::store::{AuctionStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Constants

/// Listing duration when the seller leaves the close time unset.
pub const DEFAULT_AUCTION_DAYS: i64 = 7;

/// Price floor applied when a draft carries no usable price at all.
pub const DEFAULT_MIN_PRICE: Decimal = Decimal::ONE;

// endregion: --- Constants

// region:    --- Lifecycle Error

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Only the auction variant is biddable; fixed-price and borrow
    /// listings belong to sibling services.
    #[error("listing kind {0:?} cannot be auctioned")]
    UnsupportedListingKind(ListingKind),

    #[error("auction id must be set")]
    MissingAuctionId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

// endregion: --- Lifecycle Error

// region:    --- Lifecycle Service

pub struct AuctionLifecycleService<S: AuctionStore> {
    store: Arc<S>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl<S: AuctionStore> AuctionLifecycleService<S> {
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

    /// Persist a seller's draft, filling in whatever it left out: start time
    /// defaults to now, end time to seven days out when unset or already
    /// past, and the start/current prices are reconciled (one copied across
    /// when the other is missing, both floored to the minimum when neither
    /// is usable). Defaults are affordances, not validation; the strict
    /// rules live in bid validation.
    pub async fn create_listing(&self, draft: ListingDraft) -> Result<Auction, LifecycleError> {
        if draft.kind != ListingKind::Auction {
            return Err(LifecycleError::UnsupportedListingKind(draft.kind));
        }

        let now = Utc::now();
        let start_time = draft.start_time.unwrap_or(now);
        let end_time = match draft.end_time {
            Some(end) if end > now => end,
            _ => now + Duration::days(DEFAULT_AUCTION_DAYS),
        };

        let start = draft.start_price.filter(|price| *price > Decimal::ZERO);
        let current = draft.current_price.filter(|price| *price > Decimal::ZERO);
        let (start_price, current_price) = match (start, current) {
            (Some(start), Some(current)) => (start, current),
            (Some(start), None) => (start, start),
            (None, Some(current)) => (current, current),
            (None, None) => (DEFAULT_MIN_PRICE, DEFAULT_MIN_PRICE),
        };

        let status = if start_time <= now {
            AuctionStatus::Active
        } else {
            AuctionStatus::Scheduled
        };

        let auction = Auction {
            id: 0,
            seller_id: draft.seller_id,
            title: draft.title,
            description: draft.description,
            category_id: draft.category_id,
            condition_id: draft.condition_id,
            tags: draft.tags,
            start_price,
            current_price,
            start_time,
            end_time,
            status,
            bids: Vec::new(),
            created_at: now,
        };

        let persisted = self.store.create_auction(&auction).await?;
        info!(
            "{:<12} --> listing created: auction {} by seller {}, closes {}",
            "Lifecycle", persisted.id, persisted.seller_id, persisted.end_time
        );

        self.publish(AuctionEvent::ListingCreated {
            auction_id: persisted.id,
            seller_id: persisted.seller_id,
            start_price: persisted.start_price,
            timestamp: now,
        })
        .await;

        Ok(persisted)
    }

    /// Mark an auction ended. Concluding an already-ended auction is not an
    /// error.
    pub async fn conclude_auction(&self, auction_id: i64) -> Result<(), LifecycleError> {
        if auction_id <= 0 {
            return Err(LifecycleError::MissingAuctionId);
        }

        self.store.conclude_auction(auction_id).await?;
        info!("{:<12} --> auction {} concluded", "Lifecycle", auction_id);

        self.publish(AuctionEvent::AuctionConcluded {
            auction_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(())
    }

    /// Auctions matching the filter, stably sorted by the selected field.
    /// Ties keep the store's ordering.
    pub async fn sorted_filtered_auctions(
        &self,
        filter: &AuctionFilter,
        sort: Option<AuctionSort>,
    ) -> Result<Vec<Auction>, LifecycleError> {
        let mut auctions = self.store.list_auctions(filter).await?;
        if let Some(sort) = sort {
            sort_auctions(&mut auctions, sort);
        }
        Ok(auctions)
    }

    async fn publish(&self, event: AuctionEvent) {
        if let Some(publisher) = &self.publisher {
            if let Err(e) = publisher.publish(&event).await {
                warn!("{:<12} --> event publish failed: {}", "Lifecycle", e);
            }
        }
    }
}

// endregion: --- Lifecycle Service

// region:    --- Countdown Helpers

pub fn is_ended(auction: &Auction, now: DateTime<Utc>) -> bool {
    auction.is_ended(now)
}

/// Remaining time as `dd:hh:mm:ss`, or the ended sentinel.
pub fn time_left(auction: &Auction, now: DateTime<Utc>) -> String {
    if now >= auction.end_time {
        return "Auction Ended".to_string();
    }
    let left = auction.end_time - now;
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        left.num_days(),
        left.num_hours() % 24,
        left.num_minutes() % 60,
        left.num_seconds() % 60
    )
}

// endregion: --- Countdown Helpers

// region:    --- Sorting

/// Stable sort, so equal keys keep their original order.
fn sort_auctions(auctions: &mut [Auction], sort: AuctionSort) {
    auctions.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Title => a.title.cmp(&b.title),
            SortField::StartPrice => a.start_price.cmp(&b.start_price),
            SortField::CurrentPrice => a.current_price.cmp(&b.current_price),
            SortField::StartTime => a.start_time.cmp(&b.start_time),
            SortField::EndTime => a.end_time.cmp(&b.end_time),
        };
        if sort.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

// endregion: --- Sorting
