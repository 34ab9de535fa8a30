// region:    --- Imports
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
// endregion: --- Imports

// region:    --- Status

/// Auction lifecycle: Scheduled -> Active -> Ended. Stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Scheduled,
    Active,
    Ended,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "SCHEDULED",
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Ended => "ENDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(AuctionStatus::Scheduled),
            "ACTIVE" => Some(AuctionStatus::Active),
            "ENDED" => Some(AuctionStatus::Ended),
            _ => None,
        }
    }
}

// endregion: --- Status

// region:    --- Auction Model

/// One listing under bid. `id == 0` means not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub condition_id: Option<i64>,
    pub tags: Vec<String>,
    pub start_price: Decimal,
    pub current_price: Decimal,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AuctionStatus,
    /// Accepted bids in acceptance order; the last entry holds the current price.
    pub bids: Vec<Bid>,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    /// Highest accepted bid, if any.
    pub fn highest_bid(&self) -> Option<&Bid> {
        self.bids.last()
    }

    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Ended || now >= self.end_time
    }
}

/// Immutable record of one accepted bid.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
}

// endregion: --- Auction Model

// region:    --- Listing Draft

/// What a listing is sold as. Only `Auction` is biddable; the other kinds
/// are handled by sibling services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Auction,
    FixedPrice,
    Borrow,
}

/// Seller-submitted listing before defaults are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDraft {
    pub kind: ListingKind,
    pub seller_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<i64>,
    pub condition_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub start_price: Option<Decimal>,
    pub current_price: Option<Decimal>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

// endregion: --- Listing Draft

// region:    --- Filter & Sort

/// Listing filter. Empty collections match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionFilter {
    #[serde(default)]
    pub category_ids: Vec<i64>,
    #[serde(default)]
    pub condition_ids: Vec<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub search: Option<String>,
}

impl AuctionFilter {
    /// In-memory counterpart of the store-side filter predicate.
    pub fn matches(&self, auction: &Auction) -> bool {
        let matches_category = self.category_ids.is_empty()
            || auction
                .category_id
                .is_some_and(|id| self.category_ids.contains(&id));
        let matches_condition = self.condition_ids.is_empty()
            || auction
                .condition_id
                .is_some_and(|id| self.condition_ids.contains(&id));
        let matches_tags =
            self.tags.is_empty() || self.tags.iter().any(|tag| auction.tags.contains(tag));
        let matches_search = match &self.search {
            None => true,
            Some(query) if query.is_empty() => true,
            Some(query) => auction.title.to_lowercase().contains(&query.to_lowercase()),
        };
        matches_category && matches_condition && matches_tags && matches_search
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    StartPrice,
    CurrentPrice,
    StartTime,
    EndTime,
}

/// Sort selection for listing queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuctionSort {
    pub field: SortField,
    pub ascending: bool,
}

// endregion: --- Filter & Sort
