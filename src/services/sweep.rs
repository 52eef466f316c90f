//! Out-of-band stale-data sweep.
//!
//! Runs on its own schedule (default daily), independent of request
//! handling, and only reads: it flags funded accounts whose balance has not
//! been updated for more than a day and publishes notification events for
//! the dashboards. It never holds a financial-mutation transaction open.

use crate::events::{EventBus, LedgerEvent};
use crate::repositories::AccountRepository;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub struct SweepService {
    account_repo: Arc<AccountRepository>,
    events: Arc<EventBus>,
    interval: Duration,
}

impl SweepService {
    pub fn new(
        account_repo: Arc<AccountRepository>,
        events: Arc<EventBus>,
        interval: Duration,
    ) -> Self {
        Self {
            account_repo,
            events,
            interval,
        }
    }

    /// Run the sweep loop forever. Spawn this on its own task.
    pub async fn start(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        // First tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;

        info!("Stale-balance sweep started (every {:?})", self.interval);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!("Stale-balance sweep failed: {}", e);
            }
        }
    }

    /// One sweep pass
    pub async fn run_once(&self) -> Result<usize, crate::error::AppError> {
        let cutoff = Utc::now().naive_utc() - ChronoDuration::days(1);
        let stale = self.account_repo.list_stale(cutoff).await?;

        for account in &stale {
            self.events.publish(LedgerEvent::StaleBalance {
                user_id: account.user_id,
                account_id: account.id,
            });
        }

        if !stale.is_empty() {
            info!("Stale-balance sweep flagged {} accounts", stale.len());
        }

        Ok(stale.len())
    }
}
