use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Membership tiers, ordered by generosity of cancellation terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipTier {
    Regular,
    Silver,
    Gold,
    Vip,
}

impl MembershipTier {
    /// Parse a stored tier code. Unknown codes return `None`; the caller
    /// decides (and logs) any fallback.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "REGULAR" => Some(Self::Regular),
            "SILVER" => Some(Self::Silver),
            "GOLD" => Some(Self::Gold),
            "VIP" => Some(Self::Vip),
            _ => None,
        }
    }
}

/// Remaining session credits on a user's pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipCredit {
    pub remaining: i32,
    pub expires_at: DateTime<Utc>,
}

impl MembershipCredit {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Read-only classification of a user, used to parameterize policy
/// calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMembership {
    pub user_id: String,
    pub tier: MembershipTier,
    pub credit: Option<MembershipCredit>,
}
