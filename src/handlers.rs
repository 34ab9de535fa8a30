// region:    --- Imports
use crate::auction::model::{AuctionFilter, AuctionSort, ListingDraft, SortField};
use crate::bidding::engine::{AuctionBiddingEngine, BidError};
use crate::bidding::validate::BidRejection;
use crate::lifecycle::{self, AuctionLifecycleService, LifecycleError};
use crate::store::{AuctionStore, CommitError, PostgresAuctionStore, StoreError};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
// endregion: --- Imports

// region:    --- App State

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AuctionBiddingEngine<PostgresAuctionStore>>,
    pub lifecycle: Arc<AuctionLifecycleService<PostgresAuctionStore>>,
    pub store: Arc<PostgresAuctionStore>,
}

// endregion: --- App State

// region:    --- Requests

#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ListAuctionsQuery {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub condition_id: Option<i64>,
    pub tag: Option<String>,
    pub sort: Option<SortField>,
    pub ascending: Option<bool>,
}

impl ListAuctionsQuery {
    fn filter(&self) -> AuctionFilter {
        AuctionFilter {
            category_ids: self.category_id.into_iter().collect(),
            condition_ids: self.condition_id.into_iter().collect(),
            tags: self.tag.iter().cloned().collect(),
            search: self.search.clone(),
        }
    }

    fn sort(&self) -> Option<AuctionSort> {
        self.sort.map(|field| AuctionSort {
            field,
            ascending: self.ascending.unwrap_or(true),
        })
    }
}

// endregion: --- Requests

// region:    --- Error Mapping

fn bid_error_response(error: BidError) -> axum::response::Response {
    match error {
        BidError::Rejected(rejection) => {
            let mut body = serde_json::json!({
                "error": rejection.to_string(),
                "code": rejection.code(),
            });
            match &rejection {
                BidRejection::BidTooLow { minimum_bid } => {
                    body["minimum_bid"] = serde_json::json!(minimum_bid);
                }
                BidRejection::NotStarted { start_time } => {
                    body["start_time"] = serde_json::json!(start_time);
                }
                _ => {}
            }
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        BidError::RejectedByStore(conflict) => {
            let body = match &conflict {
                CommitError::StalePrice { current, .. } => serde_json::json!({
                    "error": conflict.to_string(),
                    "code": "STALE_PRICE",
                    "current_price": current,
                }),
                CommitError::AuctionClosed => {
                    serde_json::json!({"error": conflict.to_string(), "code": "ALREADY_ENDED"})
                }
                CommitError::InsufficientFunds => {
                    serde_json::json!({"error": conflict.to_string(), "code": "INSUFFICIENT_FUNDS"})
                }
                CommitError::Store(_) => {
                    serde_json::json!({"error": conflict.to_string(), "code": "STORE_ERROR"})
                }
            };
            (StatusCode::CONFLICT, Json(body)).into_response()
        }
        BidError::Store(store_error) => store_error_response(store_error),
    }
}

fn store_error_response(error: StoreError) -> axum::response::Response {
    match error {
        StoreError::AuctionNotFound(_) | StoreError::BidderNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": error.to_string(), "code": "NOT_FOUND"})),
        )
            .into_response(),
        StoreError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": error.to_string(), "code": "STORE_ERROR"})),
        )
            .into_response(),
    }
}

fn lifecycle_error_response(error: LifecycleError) -> axum::response::Response {
    match error {
        LifecycleError::UnsupportedListingKind(_) | LifecycleError::MissingAuctionId => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": error.to_string(), "code": "INVALID_LISTING"})),
        )
            .into_response(),
        LifecycleError::Store(store_error) => store_error_response(store_error),
    }
}

// endregion: --- Error Mapping

// region:    --- Command Handlers

/// Place a bid.
pub async fn handle_bid(
    State(state): State<AppState>,
    Json(request): Json<PlaceBidRequest>,
) -> impl IntoResponse {
    info!("{:<12} --> bid request: {:?}", "Handler", request);

    match state
        .engine
        .place_bid(request.auction_id, request.bidder_id, request.amount)
        .await
    {
        Ok(auction) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "bid accepted",
                "current_price": auction.current_price,
                "end_time": auction.end_time,
            })),
        )
            .into_response(),
        Err(e) => bid_error_response(e),
    }
}

/// Create a listing from a seller draft.
pub async fn handle_create_listing(
    State(state): State<AppState>,
    Json(draft): Json<ListingDraft>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> create listing: seller {}",
        "Handler", draft.seller_id
    );

    match state.lifecycle.create_listing(draft).await {
        Ok(auction) => (StatusCode::CREATED, Json(auction)).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

/// Conclude an auction early.
pub async fn handle_conclude_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> conclude auction {}", "Handler", auction_id);

    match state.lifecycle.conclude_auction(auction_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// Auction snapshot with bid history.
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    match state.store.load_auction(auction_id).await {
        Ok(auction) => Json(auction).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// Bid history only, acceptance order.
pub async fn handle_get_bids(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    match state.store.load_auction(auction_id).await {
        Ok(auction) => Json(auction.bids).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// Remaining-time countdown.
pub async fn handle_get_time_left(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    match state.store.load_auction(auction_id).await {
        Ok(auction) => {
            let now = Utc::now();
            Json(serde_json::json!({
                "time_left": lifecycle::time_left(&auction, now),
                "ended": lifecycle::is_ended(&auction, now),
            }))
            .into_response()
        }
        Err(e) => store_error_response(e),
    }
}

/// Filtered, sorted listing view.
pub async fn handle_list_auctions(
    State(state): State<AppState>,
    Query(query): Query<ListAuctionsQuery>,
) -> impl IntoResponse {
    match state
        .lifecycle
        .sorted_filtered_auctions(&query.filter(), query.sort())
        .await
    {
        Ok(auctions) => Json(auctions).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

// endregion: --- Query Handlers
