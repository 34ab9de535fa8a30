use auction_engine::auction::model::{Auction, AuctionStatus, ListingDraft, ListingKind};
use auction_engine::bidding::anti_snipe::{maybe_extend, ANTI_SNIPE_WINDOW_MINUTES};
use auction_engine::bidding::engine::{AuctionBiddingEngine, BidError};
use auction_engine::bidding::validate::{minimum_bid, validate_bid, BidRejection};
use auction_engine::lifecycle::AuctionLifecycleService;
use auction_engine::store::{AuctionStore, CommitError, InMemoryAuctionStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Seller ids in tests stay well clear of the ids `register_bidder` hands out.
fn draft(seller_id: i64, start_price: Decimal) -> ListingDraft {
    ListingDraft {
        kind: ListingKind::Auction,
        seller_id,
        title: "Vintage camera".to_string(),
        description: "Working condition".to_string(),
        category_id: None,
        condition_id: None,
        tags: Vec::new(),
        start_price: Some(start_price),
        current_price: None,
        start_time: None,
        end_time: Some(Utc::now() + Duration::hours(2)),
    }
}

fn setup() -> (
    Arc<InMemoryAuctionStore>,
    Arc<AuctionBiddingEngine<InMemoryAuctionStore>>,
    AuctionLifecycleService<InMemoryAuctionStore>,
) {
    let store = Arc::new(InMemoryAuctionStore::new());
    let engine = Arc::new(AuctionBiddingEngine::new(Arc::clone(&store)));
    let lifecycle = AuctionLifecycleService::new(Arc::clone(&store));
    (store, engine, lifecycle)
}

fn sample_auction(now: DateTime<Utc>) -> Auction {
    Auction {
        id: 1,
        seller_id: 7,
        title: "Vintage camera".to_string(),
        description: String::new(),
        category_id: None,
        condition_id: None,
        tags: Vec::new(),
        start_price: dec!(10),
        current_price: dec!(10),
        start_time: now - Duration::hours(1),
        end_time: now + Duration::hours(1),
        status: AuctionStatus::Active,
        bids: Vec::new(),
        created_at: now - Duration::hours(1),
    }
}

// region:    --- Validator

#[test]
fn unsaved_auction_is_rejected() {
    let now = Utc::now();
    let mut auction = sample_auction(now);
    auction.id = 0;
    let result = validate_bid(&auction, 2, dec!(100), dec!(15), now);
    assert_eq!(result, Err(BidRejection::InvalidAuction));
}

#[test]
fn unsaved_bidder_is_rejected() {
    let now = Utc::now();
    let auction = sample_auction(now);
    let result = validate_bid(&auction, 0, dec!(100), dec!(15), now);
    assert_eq!(result, Err(BidRejection::InvalidBidder));
}

#[test]
fn seller_cannot_bid_on_own_auction() {
    let now = Utc::now();
    let auction = sample_auction(now);
    let result = validate_bid(&auction, 7, dec!(100), dec!(15), now);
    assert_eq!(result, Err(BidRejection::SelfBid));
}

#[test]
fn bid_before_start_is_rejected() {
    let now = Utc::now();
    let mut auction = sample_auction(now);
    auction.start_time = now + Duration::hours(1);
    auction.status = AuctionStatus::Scheduled;
    let result = validate_bid(&auction, 2, dec!(100), dec!(15), now);
    assert_eq!(
        result,
        Err(BidRejection::NotStarted {
            start_time: auction.start_time
        })
    );
}

#[test]
fn bid_after_end_is_rejected() {
    let now = Utc::now();
    let mut auction = sample_auction(now);
    auction.end_time = now - Duration::minutes(1);
    let result = validate_bid(&auction, 2, dec!(100), dec!(15), now);
    assert_eq!(result, Err(BidRejection::AuctionEnded));
}

#[test]
fn first_bid_may_match_the_start_price() {
    let now = Utc::now();
    let auction = sample_auction(now);
    assert_eq!(minimum_bid(&auction), dec!(10));
    assert_eq!(validate_bid(&auction, 2, dec!(100), dec!(10), now), Ok(()));
    assert_eq!(
        validate_bid(&auction, 2, dec!(100), dec!(9), now),
        Err(BidRejection::BidTooLow {
            minimum_bid: dec!(10)
        })
    );
}

#[test]
fn later_bids_need_one_increment_over_current() {
    let now = Utc::now();
    let mut auction = sample_auction(now);
    auction.bids.push(auction_engine::auction::model::Bid {
        id: 1,
        auction_id: 1,
        bidder_id: 2,
        amount: dec!(15),
        placed_at: now,
    });
    auction.current_price = dec!(15);
    assert_eq!(minimum_bid(&auction), dec!(16));
    assert_eq!(
        validate_bid(&auction, 3, dec!(100), dec!(15), now),
        Err(BidRejection::BidTooLow {
            minimum_bid: dec!(16)
        })
    );
    assert_eq!(validate_bid(&auction, 3, dec!(100), dec!(16), now), Ok(()));
}

#[test]
fn bid_over_balance_is_rejected() {
    let now = Utc::now();
    let auction = sample_auction(now);
    let result = validate_bid(&auction, 2, dec!(50), dec!(60), now);
    assert_eq!(result, Err(BidRejection::InsufficientFunds { balance: dec!(50) }));
}

// endregion: --- Validator

// region:    --- Anti-Snipe

#[test]
fn closing_bid_extends_the_auction() {
    let now = Utc::now();
    let mut auction = sample_auction(now);
    auction.end_time = now + Duration::minutes(2);
    let extended = maybe_extend(&auction, now);
    assert_eq!(extended, now + Duration::minutes(ANTI_SNIPE_WINDOW_MINUTES));
}

#[test]
fn early_bid_leaves_the_end_time_alone() {
    let now = Utc::now();
    let mut auction = sample_auction(now);
    auction.end_time = now + Duration::minutes(30);
    assert_eq!(maybe_extend(&auction, now), auction.end_time);
}

#[test]
fn extension_never_moves_the_close_earlier() {
    let now = Utc::now();
    let mut auction = sample_auction(now);
    auction.end_time = now + Duration::seconds(1);
    assert!(maybe_extend(&auction, now) > auction.end_time);
}

// endregion: --- Anti-Snipe

// region:    --- Engine

#[tokio::test]
async fn accepted_bid_updates_price_and_history() {
    let (store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(10))).await.unwrap();
    let bidder = store.register_bidder(dec!(100));

    let low = engine.place_bid(auction.id, bidder, dec!(9)).await;
    assert!(matches!(
        low,
        Err(BidError::Rejected(BidRejection::BidTooLow { minimum_bid })) if minimum_bid == dec!(10)
    ));

    let accepted = engine.place_bid(auction.id, bidder, dec!(15)).await.unwrap();
    assert_eq!(accepted.current_price, dec!(15));
    assert_eq!(accepted.bids.len(), 1);
    assert_eq!(accepted.bids[0].amount, dec!(15));
}

#[tokio::test]
async fn self_bid_is_rejected_by_the_engine() {
    let (store, engine, lifecycle) = setup();
    let seller = store.register_bidder(dec!(1000));
    let auction = lifecycle
        .create_listing(draft(seller, dec!(10)))
        .await
        .unwrap();

    let result = engine.place_bid(auction.id, seller, dec!(15)).await;
    assert!(matches!(
        result,
        Err(BidError::Rejected(BidRejection::SelfBid))
    ));
}

#[tokio::test]
async fn bid_over_balance_is_rejected_by_the_engine() {
    let (store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(10))).await.unwrap();
    let bidder = store.register_bidder(dec!(50));

    let result = engine.place_bid(auction.id, bidder, dec!(60)).await;
    assert!(matches!(
        result,
        Err(BidError::Rejected(BidRejection::InsufficientFunds { .. }))
    ));
    assert_eq!(store.load_bidder_balance(bidder).await.unwrap(), dec!(50));

    // A topped-up purse clears the same bid.
    store.set_balance(bidder, dec!(75));
    assert!(engine.place_bid(auction.id, bidder, dec!(60)).await.is_ok());
}

#[tokio::test]
async fn unknown_auction_and_bidder_surface_store_errors() {
    let (store, engine, _lifecycle) = setup();
    let bidder = store.register_bidder(dec!(100));

    let no_auction = engine.place_bid(99, bidder, dec!(15)).await;
    assert!(matches!(
        no_auction,
        Err(BidError::Store(StoreError::AuctionNotFound(99)))
    ));

    let (_store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(10))).await.unwrap();
    let no_bidder = engine.place_bid(auction.id, 42, dec!(15)).await;
    assert!(matches!(
        no_bidder,
        Err(BidError::Store(StoreError::BidderNotFound(42)))
    ));
}

#[tokio::test]
async fn bidding_on_a_concluded_auction_is_rejected() {
    let (store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(10))).await.unwrap();
    let bidder = store.register_bidder(dec!(100));

    lifecycle.conclude_auction(auction.id).await.unwrap();

    let result = engine.place_bid(auction.id, bidder, dec!(15)).await;
    assert!(matches!(
        result,
        Err(BidError::Rejected(BidRejection::AuctionEnded))
    ));
}

#[tokio::test]
async fn superseded_bidder_gets_their_escrow_back() {
    let (store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(10))).await.unwrap();
    let first = store.register_bidder(dec!(100));
    let second = store.register_bidder(dec!(100));

    engine.place_bid(auction.id, first, dec!(20)).await.unwrap();
    assert_eq!(store.load_bidder_balance(first).await.unwrap(), dec!(80));

    engine.place_bid(auction.id, second, dec!(30)).await.unwrap();
    assert_eq!(store.load_bidder_balance(first).await.unwrap(), dec!(100));
    assert_eq!(store.load_bidder_balance(second).await.unwrap(), dec!(70));
}

#[tokio::test]
async fn raising_your_own_bid_nets_to_the_difference() {
    let (store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(10))).await.unwrap();
    let bidder = store.register_bidder(dec!(100));

    engine.place_bid(auction.id, bidder, dec!(60)).await.unwrap();
    assert_eq!(store.load_bidder_balance(bidder).await.unwrap(), dec!(40));

    // 40 in the purse plus the 60 refund covers an 80 bid.
    engine.place_bid(auction.id, bidder, dec!(80)).await.unwrap();
    assert_eq!(store.load_bidder_balance(bidder).await.unwrap(), dec!(20));
}

#[tokio::test]
async fn stale_commit_applies_nothing() {
    let (store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(10))).await.unwrap();
    let bidder = store.register_bidder(dec!(100));
    engine.place_bid(auction.id, bidder, dec!(20)).await.unwrap();

    let loser = store.register_bidder(dec!(100));
    let result = store
        .commit_bid(
            auction.id,
            loser,
            dec!(25),
            dec!(10), // stale: the price has since moved to 20
            Utc::now() + Duration::hours(1),
            Utc::now(),
        )
        .await;
    assert!(matches!(
        result,
        Err(CommitError::StalePrice { current, .. }) if current == dec!(20)
    ));

    let after = store.load_auction(auction.id).await.unwrap();
    assert_eq!(after.current_price, dec!(20));
    assert_eq!(after.bids.len(), 1);
    assert_eq!(store.load_bidder_balance(loser).await.unwrap(), dec!(100));
}

#[tokio::test]
async fn a_bid_near_the_close_pushes_the_end_time_out() {
    let (store, engine, lifecycle) = setup();
    let mut listing = draft(999, dec!(10));
    listing.end_time = Some(Utc::now() + Duration::minutes(2));
    let auction = lifecycle.create_listing(listing).await.unwrap();
    let bidder = store.register_bidder(dec!(100));

    let before = Utc::now();
    let committed = engine.place_bid(auction.id, bidder, dec!(15)).await.unwrap();

    assert!(committed.end_time > auction.end_time);
    let window = Duration::minutes(ANTI_SNIPE_WINDOW_MINUTES);
    assert!(committed.end_time >= before + window);
    assert!(committed.end_time <= Utc::now() + window);
}

#[tokio::test]
async fn accepted_amounts_are_strictly_increasing() {
    let (store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(10))).await.unwrap();
    let first = store.register_bidder(dec!(1000));
    let second = store.register_bidder(dec!(1000));

    for (bidder, amount) in [
        (first, dec!(10)),
        (second, dec!(12)),
        (first, dec!(20)),
        (second, dec!(21)),
    ] {
        engine.place_bid(auction.id, bidder, amount).await.unwrap();
    }

    let after = store.load_auction(auction.id).await.unwrap();
    assert_eq!(after.current_price, dec!(21));
    assert_eq!(
        after.current_price,
        after.bids.last().map(|bid| bid.amount).unwrap()
    );
    for pair in after.bids.windows(2) {
        assert!(pair[0].amount < pair[1].amount);
    }
}

#[tokio::test]
async fn concurrent_bids_never_commit_against_the_same_prior_state() {
    let (store, engine, lifecycle) = setup();
    let auction = lifecycle.create_listing(draft(999, dec!(90))).await.unwrap();
    let opener = store.register_bidder(dec!(1000));
    engine.place_bid(auction.id, opener, dec!(90)).await.unwrap();

    let b1 = store.register_bidder(dec!(1000));
    let b2 = store.register_bidder(dec!(1000));

    let t1 = tokio::spawn({
        let engine = Arc::clone(&engine);
        let id = auction.id;
        async move { engine.place_bid(id, b1, dec!(100)).await }
    });
    let t2 = tokio::spawn({
        let engine = Arc::clone(&engine);
        let id = auction.id;
        async move { engine.place_bid(id, b2, dec!(101)).await }
    });

    let r1 = t1.await.unwrap();
    let r2 = t2.await.unwrap();

    let after = store.load_auction(auction.id).await.unwrap();
    let accepted: Vec<Decimal> = after.bids.iter().map(|bid| bid.amount).collect();

    // Either both landed in some order (final price 101) or one lost the
    // race; a final price of 100 with both accepted would mean two commits
    // saw the same prior state.
    if r1.is_ok() && r2.is_ok() {
        assert_eq!(after.current_price, dec!(101));
    } else {
        let loser = [&r1, &r2]
            .into_iter()
            .find(|result| result.is_err())
            .unwrap();
        assert!(matches!(
            loser,
            Err(BidError::RejectedByStore(CommitError::StalePrice { .. }))
                | Err(BidError::Rejected(BidRejection::BidTooLow { .. }))
        ));
    }
    for pair in after.bids.windows(2) {
        assert!(pair[0].amount < pair[1].amount);
    }
    assert_eq!(after.current_price, *accepted.last().unwrap());
}

// endregion: --- Engine
