use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fitgrid_availability::{classify, ScheduleStatus};
use fitgrid_core::repository::{MembershipRepository, ReservationRepository, ScheduleRepository};
use fitgrid_core::{RejectReason, StoreError};
use fitgrid_shared::MembershipCredit;

/// Outcome of an admission check. Rejections are data, not errors; the
/// message is what the booking surface shows the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub reason: Option<RejectReason>,
    pub message: String,
    /// Availability classification of the schedule, on acceptance.
    pub status: Option<ScheduleStatus>,
    /// Session-credit snapshot loaded during the check, on acceptance.
    pub credit: Option<MembershipCredit>,
}

impl AdmissionDecision {
    fn rejected(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            message: message.into(),
            status: None,
            credit: None,
        }
    }

    fn granted(status: ScheduleStatus, credit: Option<MembershipCredit>) -> Self {
        Self {
            allowed: true,
            reason: None,
            message: "Reservation can proceed.".to_string(),
            status: Some(status),
            credit,
        }
    }
}

/// Validates whether a reservation attempt may proceed, applying a strict
/// ordered rule sequence; the first failing rule short-circuits.
pub struct AdmissionChecker {
    schedules: Arc<dyn ScheduleRepository>,
    reservations: Arc<dyn ReservationRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl AdmissionChecker {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        reservations: Arc<dyn ReservationRepository>,
        memberships: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self {
            schedules,
            reservations,
            memberships,
        }
    }

    /// Admission reads the schedule repository directly, never the
    /// availability cache: the decision must see the freshest seat count.
    pub async fn check_reservation_availability(
        &self,
        schedule_id: Uuid,
        student_count: i32,
        user: Option<&str>,
        sessions_required: i32,
    ) -> Result<AdmissionDecision, StoreError> {
        let Some(schedule) = self.schedules.get_schedule(schedule_id).await? else {
            return Ok(AdmissionDecision::rejected(
                RejectReason::NotFound,
                "Class schedule not found.",
            ));
        };

        if schedule.is_cancelled {
            return Ok(AdmissionDecision::rejected(
                RejectReason::Cancelled,
                "This class has been cancelled.",
            ));
        }

        if schedule.start_at < Utc::now() {
            return Ok(AdmissionDecision::rejected(
                RejectReason::PastClass,
                "This class has already started.",
            ));
        }

        if schedule.remaining_seats < student_count {
            return Ok(AdmissionDecision::rejected(
                RejectReason::NotEnoughSeats,
                format!("Only {} seat(s) remaining.", schedule.remaining_seats),
            ));
        }

        let status = classify(&schedule);

        // Guest checkout: with no user there is nothing to dedupe and no
        // pass to charge, so the member rules are skipped on purpose.
        let Some(user_id) = user else {
            return Ok(AdmissionDecision::granted(status, None));
        };

        if self
            .reservations
            .confirmed_reservation(user_id, schedule_id)
            .await?
            .is_some()
        {
            return Ok(AdmissionDecision::rejected(
                RejectReason::AlreadyReserved,
                "You already have a confirmed reservation for this class.",
            ));
        }

        let Some(credit) = self.memberships.session_credit(user_id).await? else {
            return Ok(AdmissionDecision::rejected(
                RejectReason::NoValidSession,
                "No active session pass on this account.",
            ));
        };
        if credit.is_expired() {
            return Ok(AdmissionDecision::rejected(
                RejectReason::NoValidSession,
                "Your session pass has expired.",
            ));
        }
        if credit.remaining < sessions_required {
            return Ok(AdmissionDecision::rejected(
                RejectReason::InsufficientSessions,
                format!(
                    "{} session(s) required, {} remaining on your pass.",
                    sessions_required, credit.remaining
                ),
            ));
        }

        Ok(AdmissionDecision::granted(status, Some(credit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fitgrid_shared::{
        ClassSchedule, ClassType, MembershipTier, Reservation, ReservationStatus, UserMembership,
    };
    use fitgrid_store::MemoryStore;

    fn checker(store: Arc<MemoryStore>) -> AdmissionChecker {
        AdmissionChecker::new(store.clone(), store.clone(), store)
    }

    fn schedule(start_in: Duration, capacity: i32) -> ClassSchedule {
        ClassSchedule::new(
            Uuid::new_v4(),
            ClassType::Regular,
            Utc::now() + start_in,
            60,
            capacity,
        )
    }

    fn member(user_id: &str, remaining: i32, credit_expires_in: Duration) -> UserMembership {
        UserMembership {
            user_id: user_id.to_string(),
            tier: MembershipTier::Regular,
            credit: Some(MembershipCredit {
                remaining,
                expires_at: Utc::now() + credit_expires_in,
            }),
        }
    }

    #[tokio::test]
    async fn test_cancelled_schedule_rejects_first() {
        let store = Arc::new(MemoryStore::new());
        let mut s = schedule(Duration::hours(-1), 10);
        s.is_cancelled = true;
        s.remaining_seats = 0;
        let id = s.id;
        store.insert_schedule(s).await;

        // Cancelled wins over past-class and seat checks.
        let decision = checker(store)
            .check_reservation_availability(id, 1, None, 1)
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(RejectReason::Cancelled));
    }

    #[tokio::test]
    async fn test_past_class_rejects() {
        let store = Arc::new(MemoryStore::new());
        let s = schedule(Duration::hours(-1), 10);
        let id = s.id;
        store.insert_schedule(s).await;

        let decision = checker(store)
            .check_reservation_availability(id, 1, None, 1)
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(RejectReason::PastClass));
    }

    #[tokio::test]
    async fn test_not_enough_seats_rejects_regardless_of_user() {
        let store = Arc::new(MemoryStore::new());
        let mut s = schedule(Duration::days(1), 10);
        s.remaining_seats = 1;
        let id = s.id;
        store.insert_schedule(s).await;
        store.insert_membership(member("user-1", 10, Duration::days(30))).await;

        let decision = checker(store)
            .check_reservation_availability(id, 2, Some("user-1"), 1)
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(RejectReason::NotEnoughSeats));
    }

    #[tokio::test]
    async fn test_duplicate_confirmed_reservation_rejects() {
        let store = Arc::new(MemoryStore::new());
        let s = schedule(Duration::days(1), 10);
        let id = s.id;
        store.insert_schedule(s).await;
        store.insert_membership(member("user-1", 10, Duration::days(30))).await;

        let mut existing = Reservation::new_hold(
            "user-1".to_string(),
            id,
            1,
            30000,
            None,
            Duration::minutes(5),
        );
        existing.status = ReservationStatus::Confirmed;
        store.insert_reservation(existing).await;

        let decision = checker(store)
            .check_reservation_availability(id, 1, Some("user-1"), 1)
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(RejectReason::AlreadyReserved));
    }

    #[tokio::test]
    async fn test_missing_and_expired_credit_reject() {
        let store = Arc::new(MemoryStore::new());
        let s = schedule(Duration::days(1), 10);
        let id = s.id;
        store.insert_schedule(s).await;

        let decision = checker(store.clone())
            .check_reservation_availability(id, 1, Some("no-pass"), 1)
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(RejectReason::NoValidSession));

        store
            .insert_membership(member("stale-pass", 10, Duration::days(-1)))
            .await;
        let decision = checker(store)
            .check_reservation_availability(id, 1, Some("stale-pass"), 1)
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(RejectReason::NoValidSession));
    }

    #[tokio::test]
    async fn test_insufficient_sessions_rejects() {
        let store = Arc::new(MemoryStore::new());
        let s = schedule(Duration::days(1), 10);
        let id = s.id;
        store.insert_schedule(s).await;
        store.insert_membership(member("user-1", 1, Duration::days(30))).await;

        let decision = checker(store)
            .check_reservation_availability(id, 1, Some("user-1"), 2)
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(RejectReason::InsufficientSessions));
    }

    #[tokio::test]
    async fn test_guest_skips_member_rules() {
        let store = Arc::new(MemoryStore::new());
        let s = schedule(Duration::days(1), 10);
        let id = s.id;
        store.insert_schedule(s).await;

        // No membership on record anywhere, yet a guest may proceed.
        let decision = checker(store)
            .check_reservation_availability(id, 2, None, 1)
            .await
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.status, Some(ScheduleStatus::Available));
        assert!(decision.credit.is_none());
    }

    #[tokio::test]
    async fn test_acceptance_returns_status_and_credit_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let mut s = schedule(Duration::days(1), 10);
        s.remaining_seats = 2;
        let id = s.id;
        store.insert_schedule(s).await;
        store.insert_membership(member("user-1", 5, Duration::days(30))).await;

        let decision = checker(store)
            .check_reservation_availability(id, 1, Some("user-1"), 1)
            .await
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.status, Some(ScheduleStatus::Limited));
        assert_eq!(decision.credit.unwrap().remaining, 5);
    }
}
