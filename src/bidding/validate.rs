/// Bid validation
/// Pure checks against auction and bidder snapshots; no side effects, safe
/// to call repeatedly and concurrently. The authoritative re-check happens
/// inside the store commit.
// region:    --- Imports
use crate::auction::model::Auction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
// endregion: --- Imports

// region:    --- Bid Rejection

/// Why a candidate bid was turned away before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidRejection {
    #[error("cannot bid on an unsaved auction")]
    InvalidAuction,

    #[error("cannot bid with an unsaved user profile")]
    InvalidBidder,

    #[error("you cannot bid on your own auction")]
    SelfBid,

    #[error("auction hasn't started yet, starts at {start_time}")]
    NotStarted { start_time: DateTime<Utc> },

    #[error("auction already ended")]
    AuctionEnded,

    #[error("bid must be at least ${minimum_bid}")]
    BidTooLow { minimum_bid: Decimal },

    #[error("insufficient balance")]
    InsufficientFunds { balance: Decimal },
}

impl BidRejection {
    /// Stable machine code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::InvalidAuction => "INVALID_AUCTION",
            BidRejection::InvalidBidder => "INVALID_BIDDER",
            BidRejection::SelfBid => "SELF_BID",
            BidRejection::NotStarted { .. } => "NOT_STARTED",
            BidRejection::AuctionEnded => "ALREADY_ENDED",
            BidRejection::BidTooLow { .. } => "LOW_BID",
            BidRejection::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
        }
    }
}

// endregion: --- Bid Rejection

// region:    --- Validation

/// Smallest amount a bid must exceed the current price by.
pub const BID_INCREMENT: Decimal = Decimal::ONE;

/// Minimum acceptable bid: the start price for a fresh auction, one
/// increment over the current price once any bid exists.
pub fn minimum_bid(auction: &Auction) -> Decimal {
    if auction.bids.is_empty() {
        auction.start_price
    } else {
        auction.current_price + BID_INCREMENT
    }
}

/// Validate a candidate bid, short-circuiting on the first failure. The
/// balance check is always applied; there is no id-only variant that skips
/// it.
pub fn validate_bid(
    auction: &Auction,
    bidder_id: i64,
    bidder_balance: Decimal,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    if auction.id <= 0 {
        return Err(BidRejection::InvalidAuction);
    }
    if bidder_id <= 0 {
        return Err(BidRejection::InvalidBidder);
    }
    if bidder_id == auction.seller_id {
        return Err(BidRejection::SelfBid);
    }
    if now < auction.start_time {
        return Err(BidRejection::NotStarted {
            start_time: auction.start_time,
        });
    }
    if auction.is_ended(now) {
        return Err(BidRejection::AuctionEnded);
    }
    let minimum = minimum_bid(auction);
    if amount < minimum {
        return Err(BidRejection::BidTooLow {
            minimum_bid: minimum,
        });
    }
    if amount > bidder_balance {
        return Err(BidRejection::InsufficientFunds {
            balance: bidder_balance,
        });
    }
    Ok(())
}

// endregion: --- Validation
