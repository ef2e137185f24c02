use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use fitgrid_availability::AvailabilityCache;
use fitgrid_core::repository::{ReservationRepository, ScheduleRepository};
use fitgrid_core::{RejectReason, StoreError};
use fitgrid_shared::ReservationStatus;

use crate::executor::CancellationExecutor;

/// Summary of a class-wide cancellation. `success` means the schedule was
/// marked cancelled; callers inspect `cancelled_count` against
/// `reservation_count` to detect partial completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassCancellationSummary {
    pub success: bool,
    pub reason: Option<RejectReason>,
    pub cancelled_count: usize,
    pub reservation_count: usize,
    pub message: String,
}

impl ClassCancellationSummary {
    fn rejected(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason),
            cancelled_count: 0,
            reservation_count: 0,
            message: message.into(),
        }
    }
}

/// Cancels a whole schedule and fans the member cancellations out.
pub struct ClassCancellationOrchestrator {
    schedules: Arc<dyn ScheduleRepository>,
    reservations: Arc<dyn ReservationRepository>,
    executor: Arc<CancellationExecutor>,
    cache: Arc<AvailabilityCache>,
}

impl ClassCancellationOrchestrator {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        reservations: Arc<dyn ReservationRepository>,
        executor: Arc<CancellationExecutor>,
        cache: Arc<AvailabilityCache>,
    ) -> Self {
        Self {
            schedules,
            reservations,
            executor,
            cache,
        }
    }

    pub async fn cancel_class_schedule(
        &self,
        schedule_id: Uuid,
        admin_id: &str,
        reason: &str,
    ) -> Result<ClassCancellationSummary, StoreError> {
        let Some(schedule) = self.schedules.get_schedule(schedule_id).await? else {
            return Ok(ClassCancellationSummary::rejected(
                RejectReason::NotFound,
                "Class schedule not found.",
            ));
        };
        if schedule.is_cancelled {
            return Ok(ClassCancellationSummary::rejected(
                RejectReason::AlreadyCancelled,
                "Class schedule has already been cancelled.",
            ));
        }

        self.schedules.mark_cancelled(schedule_id, reason).await?;

        let confirmed = self
            .reservations
            .reservations_for_schedule(schedule_id, ReservationStatus::Confirmed)
            .await?;
        let reservation_count = confirmed.len();

        // Each member cancellation stands alone; one failure must not
        // abort the rest.
        let results = join_all(confirmed.iter().map(|reservation| {
            self.executor
                .admin_cancel_reservation(reservation.id, admin_id, reason, true)
        }))
        .await;

        let mut cancelled_count = 0;
        for (reservation, result) in confirmed.iter().zip(results) {
            match result {
                Ok(outcome) if outcome.success => cancelled_count += 1,
                Ok(outcome) => warn!(
                    reservation_id = %reservation.id,
                    reason = ?outcome.reason,
                    "reservation skipped during class cancellation"
                ),
                Err(err) => warn!(
                    reservation_id = %reservation.id,
                    error = %err,
                    "reservation cancellation failed during class cancellation"
                ),
            }
        }

        self.cache.invalidate(schedule_id);
        info!(
            %schedule_id,
            cancelled_count,
            reservation_count,
            "class schedule cancelled"
        );

        Ok(ClassCancellationSummary {
            success: true,
            reason: None,
            cancelled_count,
            reservation_count,
            message: format!(
                "Class cancelled; {} of {} reservations refunded.",
                cancelled_count, reservation_count
            ),
        })
    }
}
