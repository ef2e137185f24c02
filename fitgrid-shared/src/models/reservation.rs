use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation status in the lifecycle. Transitions are monotonic:
/// PENDING -> CONFIRMED, PENDING -> EXPIRED/CANCELLED,
/// CONFIRMED -> CANCELLED; a reservation never re-opens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

/// A user's claim on a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: String,
    pub schedule_id: Uuid,
    pub student_count: i32,
    pub total_price: i64,
    pub payment_method: Option<String>,
    pub status: ReservationStatus,
    /// Only meaningful while the reservation is pending.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Create a pending hold that keeps seats claimed until `hold_ttl`
    /// elapses or payment confirms it.
    pub fn new_hold(
        user_id: String,
        schedule_id: Uuid,
        student_count: i32,
        total_price: i64,
        payment_method: Option<String>,
        hold_ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            schedule_id,
            student_count,
            total_price,
            payment_method,
            status: ReservationStatus::Pending,
            expires_at: Some(now + hold_ttl),
            created_at: now,
        }
    }

    /// Whether this is a pending hold that outlived its expiry.
    pub fn is_hold_expired(&self) -> bool {
        self.status == ReservationStatus::Pending
            && self.expires_at.map(|at| Utc::now() > at).unwrap_or(false)
    }
}
