use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the wallet platform. Money transits through it between the team
/// bank and the poker sites, so it counts toward total balance but never
/// toward P&L.
pub const WALLET_PLATFORM: &str = "luxon";

/// Poker platform (or the wallet platform) a player can hold an account on
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Platform {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Platform {
    /// Whether this is the transit-only wallet platform (case-insensitive)
    pub fn is_wallet(&self) -> bool {
        self.name.eq_ignore_ascii_case(WALLET_PLATFORM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(name: &str) -> Platform {
        Platform {
            id: 1,
            name: name.to_string(),
            display_name: name.to_string(),
            is_active: true,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_wallet_detection_is_case_insensitive() {
        assert!(platform("luxon").is_wallet());
        assert!(platform("Luxon").is_wallet());
        assert!(platform("LUXON").is_wallet());
        assert!(!platform("pokerstars").is_wallet());
    }
}
