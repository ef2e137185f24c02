use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::StoreError;
use fitgrid_shared::{
    Cancellation, ClassSchedule, MembershipCredit, RefundStatus, Reservation, ReservationStatus,
    UserMembership,
};

/// Repository trait for schedule data access.
///
/// Seat accounting goes through `claim_seats`/`release_seats` only; both are
/// single guarded mutations at the storage boundary, never read-then-write
/// from this core.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn get_schedule(&self, id: Uuid) -> Result<Option<ClassSchedule>, StoreError>;

    async fn schedules_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        class_id: Option<Uuid>,
    ) -> Result<Vec<ClassSchedule>, StoreError>;

    /// Atomically decrement `remaining_seats` by `count` if enough remain.
    /// `Ok(false)` (zero rows affected) is the canonical not-enough-seats
    /// signal; a missing schedule is an error.
    async fn claim_seats(&self, id: Uuid, count: i32) -> Result<bool, StoreError>;

    /// Return `count` seats to the schedule, clamped at capacity.
    async fn release_seats(&self, id: Uuid, count: i32) -> Result<(), StoreError>;

    async fn mark_cancelled(&self, id: Uuid, reason: &str) -> Result<(), StoreError>;
}

/// Repository trait for reservation data access.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn create_reservation(&self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, StoreError>;

    /// Ownership is enforced at read time: a reservation belonging to
    /// another user is indistinguishable from a missing one.
    async fn reservation_for_user(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Reservation>, StoreError>;

    async fn confirmed_reservation(
        &self,
        user_id: &str,
        schedule_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Compare-and-swap status transition. `Ok(false)` means the
    /// reservation was no longer in `from`; callers treat that as a lost
    /// race, never as success.
    async fn transition_status(
        &self,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool, StoreError>;

    async fn reservations_for_schedule(
        &self,
        schedule_id: Uuid,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Pending holds whose expiry lies before `cutoff`.
    async fn pending_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError>;
}

/// Repository trait for the cancellation audit trail.
#[async_trait]
pub trait CancellationRepository: Send + Sync {
    async fn create_cancellation(&self, cancellation: &Cancellation) -> Result<(), StoreError>;

    async fn get_cancellation(&self, id: Uuid) -> Result<Option<Cancellation>, StoreError>;

    async fn update_refund_status(
        &self,
        id: Uuid,
        status: RefundStatus,
    ) -> Result<(), StoreError>;

    async fn mark_notification_sent(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Repository trait for membership reads. Read-only from this core's
/// perspective; credits are consumed elsewhere.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn membership(&self, user_id: &str) -> Result<Option<UserMembership>, StoreError>;

    /// The user's current session credit, if any. Expiry is judged by the
    /// caller so the rejection can say *why* the pass is unusable.
    async fn session_credit(
        &self,
        user_id: &str,
    ) -> Result<Option<MembershipCredit>, StoreError>;
}
