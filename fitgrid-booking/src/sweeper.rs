use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use fitgrid_availability::AvailabilityCache;
use fitgrid_core::repository::{ReservationRepository, ScheduleRepository};
use fitgrid_core::StoreError;
use fitgrid_shared::ReservationStatus;

/// Expires pending holds whose payment never arrived and returns their
/// seats to the schedule.
pub struct HoldSweeper {
    schedules: Arc<dyn ScheduleRepository>,
    reservations: Arc<dyn ReservationRepository>,
    cache: Arc<AvailabilityCache>,
}

impl HoldSweeper {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        reservations: Arc<dyn ReservationRepository>,
        cache: Arc<AvailabilityCache>,
    ) -> Self {
        Self {
            schedules,
            reservations,
            cache,
        }
    }

    /// One pass over expired pending holds. Returns how many were expired.
    pub async fn sweep_once(&self) -> Result<usize, StoreError> {
        let expired = self.reservations.pending_expired(Utc::now()).await?;
        let mut swept = 0;

        for reservation in expired {
            // Conditional transition: a hold confirmed or cancelled since
            // the read above keeps its seats.
            let transitioned = self
                .reservations
                .transition_status(
                    reservation.id,
                    ReservationStatus::Pending,
                    ReservationStatus::Expired,
                )
                .await?;
            if !transitioned {
                continue;
            }

            self.schedules
                .release_seats(reservation.schedule_id, reservation.student_count)
                .await?;
            self.cache.invalidate(reservation.schedule_id);
            swept += 1;
        }

        if swept > 0 {
            info!(swept, "expired stale holds");
        }
        Ok(swept)
    }

    /// Long-running sweep loop. Errors are logged and the loop continues.
    pub async fn run(self: Arc<Self>, interval_seconds: u64) {
        let mut ticker = interval(Duration::from_secs(interval_seconds));
        loop {
            ticker.tick().await;
            if let Err(err) = self.sweep_once().await {
                error!(error = %err, "hold sweep failed");
            }
        }
    }
}
