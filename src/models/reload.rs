use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reload request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReloadStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReloadStatus::Pending),
            "approved" => Ok(ReloadStatus::Approved),
            "rejected" => Ok(ReloadStatus::Rejected),
            _ => Err(format!("Invalid reload status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadStatus::Pending => "pending",
            ReloadStatus::Approved => "approved",
            ReloadStatus::Rejected => "rejected",
        }
    }
}

impl From<String> for ReloadStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(ReloadStatus::Pending)
    }
}

impl From<ReloadStatus> for String {
    fn from(status: ReloadStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A team-funded top-up of a player's platform balance. Transitions once
/// from pending to approved/rejected; an approved reload stays a debt
/// (`paid_back = false`) until the payback engine settles it, which gates
/// withdrawal creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReloadRequest {
    pub id: i64,
    pub user_id: i64,
    pub platform_id: i64,
    pub amount: Decimal,
    pub status: String, // Stored as TEXT, use ReloadStatus for type safety
    pub paid_back: bool,
    pub paid_back_at: Option<NaiveDateTime>,
    pub player_notes: Option<String>,
    pub manager_notes: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReloadRequest {
    /// Get status as an enum
    pub fn status_enum(&self) -> ReloadStatus {
        ReloadStatus::from_str(&self.status).unwrap_or(ReloadStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.status_enum() == ReloadStatus::Pending
    }

    /// Approved and not yet settled by the payback engine
    pub fn is_outstanding(&self) -> bool {
        self.status_enum() == ReloadStatus::Approved && !self.paid_back
    }
}
