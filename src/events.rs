//! Post-commit event publishing.
//!
//! The engine publishes a `LedgerEvent` after every successful commit;
//! the concrete fan-out (SSE connections, dashboards) subscribes to the
//! bus and lives outside this crate. Publishing is best effort: a bus
//! with no subscribers is normal and never fails an operation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Events emitted by the ledger after successful commits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    #[serde(rename = "balance_updated")]
    BalanceUpdated {
        user_id: i64,
        account_id: i64,
        old_balance: Decimal,
        new_balance: Decimal,
    },
    #[serde(rename = "reload_status")]
    ReloadStatus {
        reload_id: i64,
        user_id: i64,
        status: String,
    },
    #[serde(rename = "withdrawal_status")]
    WithdrawalStatus {
        withdrawal_id: i64,
        user_id: i64,
        status: String,
    },
    #[serde(rename = "reloads_paid_back")]
    ReloadsPaidBack {
        user_id: i64,
        total_paid_back: Decimal,
    },
    #[serde(rename = "stale_balance")]
    StaleBalance {
        user_id: i64,
        account_id: i64,
    },
    #[serde(rename = "dashboard_refresh")]
    DashboardRefresh,
}

/// Broadcast bus the engine publishes to and external consumers
/// (the SSE layer, dashboards) subscribe to
pub struct EventBus {
    tx: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1000); // Buffer up to 1000 events
        Self { tx }
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Call only after the corresponding transaction
    /// committed.
    pub fn publish(&self, event: LedgerEvent) {
        // No receivers is fine; nothing is listening yet
        if self.tx.send(event).is_err() {
            debug!("Ledger event dropped: no subscribers");
        }
    }

    pub fn notify_balance_updated(
        &self,
        user_id: i64,
        account_id: i64,
        old_balance: Decimal,
        new_balance: Decimal,
    ) {
        self.publish(LedgerEvent::BalanceUpdated {
            user_id,
            account_id,
            old_balance,
            new_balance,
        });
    }

    pub fn notify_reload_status(&self, reload_id: i64, user_id: i64, status: &str) {
        self.publish(LedgerEvent::ReloadStatus {
            reload_id,
            user_id,
            status: status.to_string(),
        });
    }

    pub fn notify_withdrawal_status(&self, withdrawal_id: i64, user_id: i64, status: &str) {
        self.publish(LedgerEvent::WithdrawalStatus {
            withdrawal_id,
            user_id,
            status: status.to_string(),
        });
    }

    pub fn notify_dashboard_refresh(&self) {
        self.publish(LedgerEvent::DashboardRefresh);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
