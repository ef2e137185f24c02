use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Refund lifecycle on a cancellation record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Pending,
    Completed,
    Failed,
}

/// Audit record of an executed cancellation. Written once per cancelled
/// reservation; only `refund_status` and `notification_sent` move afterwards.
/// It retains the applied rate and amount so the policy can be reconstructed
/// later without re-deriving it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub cancelled_by: String,
    pub reason: Option<String>,
    pub refund_amount: i64,
    pub refund_rate: f64,
    pub refund_status: RefundStatus,
    pub is_admin_cancellation: bool,
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl Cancellation {
    pub fn new(
        reservation_id: Uuid,
        cancelled_by: String,
        reason: Option<String>,
        refund_rate: f64,
        refund_amount: i64,
        is_admin_cancellation: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reservation_id,
            cancelled_by,
            reason,
            refund_amount,
            refund_rate,
            // A zero-amount refund needs no gateway round-trip.
            refund_status: if refund_amount > 0 {
                RefundStatus::Pending
            } else {
                RefundStatus::Completed
            },
            is_admin_cancellation,
            notification_sent: false,
            created_at: Utc::now(),
        }
    }
}
