/// Auction status sweeps
/// Drives the Scheduled -> Active -> Ended state machine by clock: listings
/// open at their start time and close at their end time without anyone
/// touching them. Conclusion by the lifecycle service remains available for
/// an explicit early close.
// region:    --- Imports
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};
// endregion: --- Imports

// region:    --- Auction Scheduler

pub struct AuctionScheduler {
    pool: Arc<PgPool>,
}

impl AuctionScheduler {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Spawn the sweep loop.
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                if let Err(e) = Self::update_auction_statuses(&pool).await {
                    error!("{:<12} --> status sweep failed: {:?}", "Scheduler", e);
                }
            }
        });
    }

    async fn update_auction_statuses(pool: &PgPool) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        sqlx::query(
            "UPDATE auctions SET status = 'ACTIVE'
             WHERE status = 'SCHEDULED' AND start_time <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        sqlx::query(
            "UPDATE auctions SET status = 'ENDED'
             WHERE status <> 'ENDED' AND end_time <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        debug!("{:<12} --> statuses swept", "Scheduler");

        Ok(())
    }
}

// endregion: --- Auction Scheduler
