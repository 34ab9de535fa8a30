// region:    --- Imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
// endregion: --- Imports

// region:    --- Auction Events

/// Integration events emitted after a state change has been committed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum AuctionEvent {
    ListingCreated {
        auction_id: i64,
        seller_id: i64,
        start_price: Decimal,
        timestamp: DateTime<Utc>,
    },
    BidAccepted {
        auction_id: i64,
        bidder_id: i64,
        amount: Decimal,
        new_end_time: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    AuctionConcluded {
        auction_id: i64,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    /// Auction the event belongs to, used as the partition key.
    pub fn auction_id(&self) -> i64 {
        match self {
            AuctionEvent::ListingCreated { auction_id, .. }
            | AuctionEvent::BidAccepted { auction_id, .. }
            | AuctionEvent::AuctionConcluded { auction_id, .. } => *auction_id,
        }
    }
}

// endregion: --- Auction Events

// region:    --- Event Publisher Trait

/// Fanout of committed auction events. Publication is best-effort: a failed
/// publish never unwinds the committed state change.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String>;
}

// endregion: --- Event Publisher Trait
