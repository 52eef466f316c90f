use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of a user within the team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Player,
    Viewer,
}

impl UserRole {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "player" => Ok(UserRole::Player),
            "viewer" => Ok(UserRole::Viewer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Player => "player",
            UserRole::Viewer => "viewer",
        }
    }

    /// Whether this role can approve requests and mutate other players' data
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(UserRole::Player)
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

/// User model. Only the identity fields the ledger needs survive here;
/// profile, banking and credential data live with the (external) auth layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: String, // Stored as TEXT, use UserRole enum for type safety
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl User {
    /// Get role as an enum
    pub fn role_enum(&self) -> UserRole {
        UserRole::from_str(&self.role).unwrap_or(UserRole::Player)
    }

    pub fn is_player(&self) -> bool {
        self.role_enum() == UserRole::Player
    }
}
