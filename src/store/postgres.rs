// region:    --- Imports
use crate::auction::model::{Auction, AuctionFilter, AuctionStatus, Bid};
use crate::database::DatabaseManager;
use crate::store::{queries, AuctionStore, CommitError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::sync::Arc;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Row Mapping

fn auction_from_row(row: &PgRow, bids: Vec<Bid>) -> Result<Auction, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = AuctionStatus::from_str(&status)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown auction status {status}").into()))?;
    Ok(Auction {
        id: row.try_get("id")?,
        seller_id: row.try_get("seller_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category_id: row.try_get("category_id")?,
        condition_id: row.try_get("condition_id")?,
        tags: row.try_get("tags")?,
        start_price: row.try_get("start_price")?,
        current_price: row.try_get("current_price")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        status,
        bids,
        created_at: row.try_get("created_at")?,
    })
}

// endregion: --- Row Mapping

// region:    --- Postgres Auction Store

pub struct PostgresAuctionStore {
    db: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn load_auction(&self, id: i64) -> Result<Auction, StoreError> {
        let auction = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    let row = sqlx::query(queries::GET_AUCTION)
                        .bind(id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    let Some(row) = row else {
                        return Ok(None);
                    };
                    let bids = sqlx::query_as::<_, Bid>(queries::GET_AUCTION_BIDS)
                        .bind(id)
                        .fetch_all(&mut **tx)
                        .await?;
                    auction_from_row(&row, bids).map(Some)
                })
            })
            .await?;
        auction.ok_or(StoreError::AuctionNotFound(id))
    }

    async fn load_bidder_balance(&self, bidder_id: i64) -> Result<Decimal, StoreError> {
        let balance = sqlx::query_scalar::<_, Decimal>(queries::GET_BIDDER_BALANCE)
            .bind(bidder_id)
            .fetch_optional(self.db.pool())
            .await?;
        balance.ok_or(StoreError::BidderNotFound(bidder_id))
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
        let mut tx = self.db.pool().begin().await.map_err(StoreError::from)?;

        // Compare-and-commit: the row lock serializes concurrent bids on the
        // same auction, so a stale expected price matches zero rows here.
        let updated = sqlx::query(queries::COMMIT_AUCTION_PRICE)
            .bind(auction_id)
            .bind(amount)
            .bind(new_end_time)
            .bind(expected_prior_price)
            .bind(placed_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        if updated.is_none() {
            let row = sqlx::query(queries::GET_AUCTION_PRICE_STATUS)
                .bind(auction_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::from)?;
            tx.rollback().await.map_err(StoreError::from)?;
            return Err(match row {
                None => CommitError::Store(StoreError::AuctionNotFound(auction_id)),
                Some(row) => {
                    let current: Decimal =
                        row.try_get("current_price").map_err(StoreError::from)?;
                    if current != expected_prior_price {
                        warn!(
                            "{:<12} --> stale price on auction {}: expected {}, found {}",
                            "Store", auction_id, expected_prior_price, current
                        );
                        CommitError::StalePrice {
                            expected: expected_prior_price,
                            current,
                        }
                    } else {
                        CommitError::AuctionClosed
                    }
                }
            });
        }

        // The losing bidder gets their escrow back before the winner is
        // debited, so a self-outbid nets to the difference.
        let previous = sqlx::query_as::<_, Bid>(queries::GET_HIGHEST_BID)
            .bind(auction_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        if let Some(previous) = &previous {
            sqlx::query(queries::CREDIT_BIDDER_BALANCE)
                .bind(previous.bidder_id)
                .bind(previous.amount)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;
        }

        let debited = sqlx::query(queries::DEBIT_BIDDER_BALANCE)
            .bind(bidder_id)
            .bind(amount)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        if debited.is_none() {
            let exists = sqlx::query(queries::BIDDER_EXISTS)
                .bind(bidder_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::from)?;
            tx.rollback().await.map_err(StoreError::from)?;
            return Err(if exists.is_some() {
                CommitError::InsufficientFunds
            } else {
                CommitError::Store(StoreError::BidderNotFound(bidder_id))
            });
        }

        sqlx::query(queries::INSERT_BID)
            .bind(auction_id)
            .bind(bidder_id)
            .bind(amount)
            .bind(placed_at)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        info!(
            "{:<12} --> bid committed: auction {} now at {}",
            "Store", auction_id, amount
        );

        Ok(self.load_auction(auction_id).await?)
    }

    async fn create_auction(&self, auction: &Auction) -> Result<Auction, StoreError> {
        let auction = auction.clone();
        let id = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_scalar::<_, i64>(queries::INSERT_AUCTION)
                        .bind(auction.seller_id)
                        .bind(&auction.title)
                        .bind(&auction.description)
                        .bind(auction.category_id)
                        .bind(auction.condition_id)
                        .bind(&auction.tags)
                        .bind(auction.start_price)
                        .bind(auction.current_price)
                        .bind(auction.start_time)
                        .bind(auction.end_time)
                        .bind(auction.status.as_str())
                        .bind(auction.created_at)
                        .fetch_one(&mut **tx)
                        .await
                })
            })
            .await?;
        self.load_auction(id).await
    }

    async fn conclude_auction(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query(queries::CONCLUDE_AUCTION)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::AuctionNotFound(id));
        }
        Ok(())
    }

    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let rows = sqlx::query(queries::LIST_AUCTIONS)
            .bind(&filter.category_ids)
            .bind(&filter.condition_ids)
            .bind(&filter.tags)
            .bind(filter.search.as_deref().unwrap_or(""))
            .fetch_all(self.db.pool())
            .await?;

        let mut auctions = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(StoreError::from)?;
            let bids = sqlx::query_as::<_, Bid>(queries::GET_AUCTION_BIDS)
                .bind(id)
                .fetch_all(self.db.pool())
                .await?;
            auctions.push(auction_from_row(row, bids).map_err(StoreError::from)?);
        }
        Ok(auctions)
    }
}

// endregion: --- Postgres Auction Store
