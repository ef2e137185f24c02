use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use fitgrid_availability::AvailabilityCache;
use fitgrid_core::repository::{ReservationRepository, ScheduleRepository};
use fitgrid_core::{RejectReason, StoreError};
use fitgrid_shared::Reservation;

use crate::admission::AdmissionChecker;

/// Result of a hold attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldOutcome {
    pub success: bool,
    pub reason: Option<RejectReason>,
    pub message: String,
    pub reservation_id: Option<Uuid>,
}

impl HoldOutcome {
    fn rejected(reason: Option<RejectReason>, message: String) -> Self {
        Self {
            success: false,
            reason,
            message,
            reservation_id: None,
        }
    }
}

/// Creates short-lived pending reservations that keep seats claimed while
/// payment is collected.
pub struct HoldManager {
    checker: Arc<AdmissionChecker>,
    schedules: Arc<dyn ScheduleRepository>,
    reservations: Arc<dyn ReservationRepository>,
    cache: Arc<AvailabilityCache>,
    hold_expiry: Duration,
}

impl HoldManager {
    pub fn new(
        checker: Arc<AdmissionChecker>,
        schedules: Arc<dyn ScheduleRepository>,
        reservations: Arc<dyn ReservationRepository>,
        cache: Arc<AvailabilityCache>,
        hold_expiry_seconds: u64,
    ) -> Self {
        Self {
            checker,
            schedules,
            reservations,
            cache,
            hold_expiry: Duration::seconds(hold_expiry_seconds as i64),
        }
    }

    pub async fn create_temp_reservation(
        &self,
        schedule_id: Uuid,
        user_id: &str,
        student_count: i32,
        total_price: i64,
        payment_method: Option<String>,
    ) -> Result<HoldOutcome, StoreError> {
        // Re-check admission right before writing, narrowing the window
        // between what the UI displayed and what the store holds.
        let decision = self
            .checker
            .check_reservation_availability(schedule_id, student_count, Some(user_id), 1)
            .await?;
        if !decision.allowed {
            return Ok(HoldOutcome::rejected(decision.reason, decision.message));
        }

        // The claim is a single guarded mutation at the store boundary; a
        // false here means another hold won the remaining seats since the
        // check above.
        if !self.schedules.claim_seats(schedule_id, student_count).await? {
            return Ok(HoldOutcome::rejected(
                Some(RejectReason::NotEnoughSeats),
                "Seats were taken while completing your reservation.".to_string(),
            ));
        }

        let reservation = Reservation::new_hold(
            user_id.to_string(),
            schedule_id,
            student_count,
            total_price,
            payment_method,
            self.hold_expiry,
        );
        let reservation_id = reservation.id;

        if let Err(err) = self.reservations.create_reservation(&reservation).await {
            // The claim must not outlive a failed write.
            if let Err(release_err) = self.schedules.release_seats(schedule_id, student_count).await
            {
                error!(
                    %schedule_id,
                    error = %release_err,
                    "failed to release claimed seats after reservation write failure"
                );
            }
            return Err(err);
        }

        self.cache.invalidate(schedule_id);
        info!(
            %reservation_id,
            %schedule_id,
            user_id,
            student_count,
            "temporary reservation created"
        );

        Ok(HoldOutcome {
            success: true,
            reason: None,
            message: format!(
                "Seats held for {} minutes pending payment.",
                self.hold_expiry.num_minutes()
            ),
            reservation_id: Some(reservation_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fitgrid_shared::{
        ClassSchedule, ClassType, MembershipCredit, MembershipTier, ReservationStatus,
        UserMembership,
    };
    use fitgrid_store::MemoryStore;

    fn manager(store: Arc<MemoryStore>) -> HoldManager {
        let checker = Arc::new(AdmissionChecker::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        HoldManager::new(
            checker,
            store.clone(),
            store,
            Arc::new(AvailabilityCache::new(30)),
            300,
        )
    }

    async fn seed(store: &MemoryStore, capacity: i32) -> Uuid {
        let schedule = ClassSchedule::new(
            Uuid::new_v4(),
            ClassType::Regular,
            Utc::now() + Duration::days(1),
            60,
            capacity,
        );
        let id = schedule.id;
        store.insert_schedule(schedule).await;
        store
            .insert_membership(UserMembership {
                user_id: "user-1".to_string(),
                tier: MembershipTier::Regular,
                credit: Some(MembershipCredit {
                    remaining: 10,
                    expires_at: Utc::now() + Duration::days(30),
                }),
            })
            .await;
        id
    }

    #[tokio::test]
    async fn test_successful_hold_claims_seats() {
        let store = Arc::new(MemoryStore::new());
        let schedule_id = seed(&store, 10).await;

        let outcome = manager(store.clone())
            .create_temp_reservation(schedule_id, "user-1", 2, 60000, Some("CARD".to_string()))
            .await
            .unwrap();
        assert!(outcome.success);

        let reservation = store
            .get_reservation(outcome.reservation_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert!(reservation.expires_at.is_some());

        let schedule = store.get_schedule(schedule_id).await.unwrap().unwrap();
        assert_eq!(schedule.remaining_seats, 8);
    }

    #[tokio::test]
    async fn test_rejection_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let schedule_id = seed(&store, 1).await;

        let outcome = manager(store.clone())
            .create_temp_reservation(schedule_id, "user-1", 2, 60000, None)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.reason, Some(RejectReason::NotEnoughSeats));
        assert!(outcome.reservation_id.is_none());

        let schedule = store.get_schedule(schedule_id).await.unwrap().unwrap();
        assert_eq!(schedule.remaining_seats, 1);
    }

    #[tokio::test]
    async fn test_last_seat_goes_to_one_of_two_racers() {
        let store = Arc::new(MemoryStore::new());
        let schedule_id = seed(&store, 1).await;
        store
            .insert_membership(UserMembership {
                user_id: "user-2".to_string(),
                tier: MembershipTier::Regular,
                credit: Some(MembershipCredit {
                    remaining: 10,
                    expires_at: Utc::now() + Duration::days(30),
                }),
            })
            .await;

        let manager = manager(store.clone());
        let (a, b) = tokio::join!(
            manager.create_temp_reservation(schedule_id, "user-1", 1, 30000, None),
            manager.create_temp_reservation(schedule_id, "user-2", 1, 30000, None),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        // Exactly one hold wins; the conditional claim rejects the other.
        let winners = [&a, &b].iter().filter(|o| o.success).count();
        assert_eq!(winners, 1);
        let loser = if a.success { &b } else { &a };
        assert_eq!(loser.reason, Some(RejectReason::NotEnoughSeats));

        let schedule = store.get_schedule(schedule_id).await.unwrap().unwrap();
        assert_eq!(schedule.remaining_seats, 0);
    }
}
