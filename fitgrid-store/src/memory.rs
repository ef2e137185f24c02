use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use fitgrid_core::repository::{
    CancellationRepository, MembershipRepository, ReservationRepository, ScheduleRepository,
};
use fitgrid_core::StoreError;
use fitgrid_shared::{
    Cancellation, ClassSchedule, MembershipCredit, RefundStatus, Reservation, ReservationStatus,
    UserMembership,
};

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(Uuid),

    #[error("Cancellation not found: {0}")]
    CancellationNotFound(Uuid),
}

/// In-memory reference store. Conditional mutations run under the write
/// lock, giving the same guarantees a single guarded SQL `UPDATE` provides.
#[derive(Default)]
pub struct MemoryStore {
    schedules: RwLock<HashMap<Uuid, ClassSchedule>>,
    reservations: RwLock<HashMap<Uuid, Reservation>>,
    cancellations: RwLock<HashMap<Uuid, Cancellation>>,
    memberships: RwLock<HashMap<String, UserMembership>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_schedule(&self, schedule: ClassSchedule) {
        self.schedules.write().await.insert(schedule.id, schedule);
    }

    pub async fn insert_reservation(&self, reservation: Reservation) {
        self.reservations
            .write()
            .await
            .insert(reservation.id, reservation);
    }

    pub async fn insert_membership(&self, membership: UserMembership) {
        self.memberships
            .write()
            .await
            .insert(membership.user_id.clone(), membership);
    }

    /// Audit-trail lookup by reservation, newest first.
    pub async fn cancellations_for_reservation(&self, reservation_id: Uuid) -> Vec<Cancellation> {
        let mut out: Vec<Cancellation> = self
            .cancellations
            .read()
            .await
            .values()
            .filter(|c| c.reservation_id == reservation_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn get_schedule(&self, id: Uuid) -> Result<Option<ClassSchedule>, StoreError> {
        Ok(self.schedules.read().await.get(&id).cloned())
    }

    async fn schedules_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        class_id: Option<Uuid>,
    ) -> Result<Vec<ClassSchedule>, StoreError> {
        let mut out: Vec<ClassSchedule> = self
            .schedules
            .read()
            .await
            .values()
            .filter(|s| s.start_at >= start && s.start_at < end)
            .filter(|s| class_id.map_or(true, |c| s.class_id == c))
            .cloned()
            .collect();
        out.sort_by_key(|s| s.start_at);
        Ok(out)
    }

    async fn claim_seats(&self, id: Uuid, count: i32) -> Result<bool, StoreError> {
        let mut schedules = self.schedules.write().await;
        let schedule = schedules
            .get_mut(&id)
            .ok_or(MemoryStoreError::ScheduleNotFound(id))?;

        if schedule.remaining_seats < count {
            return Ok(false);
        }
        schedule.remaining_seats -= count;
        Ok(true)
    }

    async fn release_seats(&self, id: Uuid, count: i32) -> Result<(), StoreError> {
        let mut schedules = self.schedules.write().await;
        let schedule = schedules
            .get_mut(&id)
            .ok_or(MemoryStoreError::ScheduleNotFound(id))?;

        schedule.remaining_seats = (schedule.remaining_seats + count).min(schedule.capacity);
        Ok(())
    }

    async fn mark_cancelled(&self, id: Uuid, reason: &str) -> Result<(), StoreError> {
        let mut schedules = self.schedules.write().await;
        let schedule = schedules
            .get_mut(&id)
            .ok_or(MemoryStoreError::ScheduleNotFound(id))?;

        schedule.is_cancelled = true;
        schedule.cancellation_reason = Some(reason.to_string());
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn create_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        self.reservations
            .write()
            .await
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn reservation_for_user(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Reservation>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned())
    }

    async fn confirmed_reservation(
        &self,
        user_id: &str,
        schedule_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .find(|r| {
                r.user_id == user_id
                    && r.schedule_id == schedule_id
                    && r.status == ReservationStatus::Confirmed
            })
            .cloned())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool, StoreError> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(&id)
            .ok_or(MemoryStoreError::ReservationNotFound(id))?;

        if reservation.status != from {
            return Ok(false);
        }
        reservation.status = to;
        Ok(true)
    }

    async fn reservations_for_schedule(
        &self,
        schedule_id: Uuid,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| r.schedule_id == schedule_id && r.status == status)
            .cloned()
            .collect())
    }

    async fn pending_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| {
                r.status == ReservationStatus::Pending
                    && r.expires_at.map(|at| at < cutoff).unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CancellationRepository for MemoryStore {
    async fn create_cancellation(&self, cancellation: &Cancellation) -> Result<(), StoreError> {
        self.cancellations
            .write()
            .await
            .insert(cancellation.id, cancellation.clone());
        Ok(())
    }

    async fn get_cancellation(&self, id: Uuid) -> Result<Option<Cancellation>, StoreError> {
        Ok(self.cancellations.read().await.get(&id).cloned())
    }

    async fn update_refund_status(
        &self,
        id: Uuid,
        status: RefundStatus,
    ) -> Result<(), StoreError> {
        let mut cancellations = self.cancellations.write().await;
        let cancellation = cancellations
            .get_mut(&id)
            .ok_or(MemoryStoreError::CancellationNotFound(id))?;

        cancellation.refund_status = status;
        Ok(())
    }

    async fn mark_notification_sent(&self, id: Uuid) -> Result<(), StoreError> {
        let mut cancellations = self.cancellations.write().await;
        let cancellation = cancellations
            .get_mut(&id)
            .ok_or(MemoryStoreError::CancellationNotFound(id))?;

        cancellation.notification_sent = true;
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn membership(&self, user_id: &str) -> Result<Option<UserMembership>, StoreError> {
        Ok(self.memberships.read().await.get(user_id).cloned())
    }

    async fn session_credit(
        &self,
        user_id: &str,
    ) -> Result<Option<MembershipCredit>, StoreError> {
        Ok(self
            .memberships
            .read()
            .await
            .get(user_id)
            .and_then(|m| m.credit.clone()))
    }
}
