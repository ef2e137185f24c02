use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use fitgrid_availability::AvailabilityCache;
use fitgrid_core::notify::Notifier;
use fitgrid_core::payment::RefundGateway;
use fitgrid_core::repository::{
    CancellationRepository, MembershipRepository, ReservationRepository, ScheduleRepository,
};
use fitgrid_core::{RejectReason, StoreError};
use fitgrid_shared::{Cancellation, RefundStatus, Reservation, ReservationStatus};

use crate::policy::evaluate;

/// Result of a cancellation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationOutcome {
    pub success: bool,
    pub reason: Option<RejectReason>,
    pub message: String,
    pub cancellation_id: Option<Uuid>,
    pub refund_rate: f64,
    pub refund_amount: i64,
    pub refund_status: Option<RefundStatus>,
}

impl CancellationOutcome {
    fn rejected(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason),
            message: message.into(),
            cancellation_id: None,
            refund_rate: 0.0,
            refund_amount: 0,
            refund_status: None,
        }
    }
}

struct CancellationTerms {
    cancelled_by: String,
    reason: String,
    refund_rate: f64,
    refund_amount: i64,
    is_admin: bool,
    notify_user: bool,
}

/// Orchestrates the full cancellation transaction: policy gate, audit
/// record, status transition, seat restoration, cache invalidation, refund
/// trigger.
pub struct CancellationExecutor {
    schedules: Arc<dyn ScheduleRepository>,
    reservations: Arc<dyn ReservationRepository>,
    cancellations: Arc<dyn CancellationRepository>,
    memberships: Arc<dyn MembershipRepository>,
    refunds: Arc<dyn RefundGateway>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<AvailabilityCache>,
}

impl CancellationExecutor {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        reservations: Arc<dyn ReservationRepository>,
        cancellations: Arc<dyn CancellationRepository>,
        memberships: Arc<dyn MembershipRepository>,
        refunds: Arc<dyn RefundGateway>,
        notifier: Arc<dyn Notifier>,
        cache: Arc<AvailabilityCache>,
    ) -> Self {
        Self {
            schedules,
            reservations,
            cancellations,
            memberships,
            refunds,
            notifier,
            cache,
        }
    }

    /// User-initiated cancellation. The reservation is loaded scoped to the
    /// requesting user; anyone else's reservation reads as absent.
    pub async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        user_id: &str,
        reason: &str,
    ) -> Result<CancellationOutcome, StoreError> {
        let Some(reservation) = self
            .reservations
            .reservation_for_user(reservation_id, user_id)
            .await?
        else {
            return Ok(CancellationOutcome::rejected(
                RejectReason::NotFound,
                "Reservation not found.",
            ));
        };
        if let Some(outcome) = Self::terminal_status_rejection(&reservation) {
            return Ok(outcome);
        }

        let Some(schedule) = self.schedules.get_schedule(reservation.schedule_id).await? else {
            return Err(format!(
                "schedule {} missing for reservation {}",
                reservation.schedule_id, reservation_id
            )
            .into());
        };
        let membership = self.memberships.membership(user_id).await?;

        let quote = evaluate(&reservation, &schedule, membership.as_ref());
        if !quote.can_cancel {
            return Ok(CancellationOutcome::rejected(
                RejectReason::PolicyDenied,
                quote.message,
            ));
        }

        self.execute(
            &reservation,
            CancellationTerms {
                cancelled_by: user_id.to_string(),
                reason: reason.to_string(),
                refund_rate: quote.refund_rate,
                refund_amount: quote.refund_amount,
                is_admin: false,
                notify_user: false,
            },
        )
        .await
    }

    /// Admin-initiated cancellation: the policy gate is skipped and the
    /// refund is unconditionally the full price.
    pub async fn admin_cancel_reservation(
        &self,
        reservation_id: Uuid,
        admin_id: &str,
        reason: &str,
        notify_user: bool,
    ) -> Result<CancellationOutcome, StoreError> {
        let Some(reservation) = self.reservations.get_reservation(reservation_id).await? else {
            return Ok(CancellationOutcome::rejected(
                RejectReason::NotFound,
                "Reservation not found.",
            ));
        };
        if let Some(outcome) = Self::terminal_status_rejection(&reservation) {
            return Ok(outcome);
        }

        self.execute(
            &reservation,
            CancellationTerms {
                cancelled_by: admin_id.to_string(),
                reason: reason.to_string(),
                refund_rate: 1.0,
                refund_amount: reservation.total_price,
                is_admin: true,
                notify_user,
            },
        )
        .await
    }

    fn terminal_status_rejection(reservation: &Reservation) -> Option<CancellationOutcome> {
        match reservation.status {
            ReservationStatus::Cancelled => Some(CancellationOutcome::rejected(
                RejectReason::AlreadyCancelled,
                "Reservation has already been cancelled.",
            )),
            ReservationStatus::Expired => Some(CancellationOutcome::rejected(
                RejectReason::AlreadyCancelled,
                "Reservation hold has already expired.",
            )),
            _ => None,
        }
    }

    /// Shared core sequence. Failures in here are hard errors: the
    /// operation either commits the status transition or reports that
    /// nothing happened.
    async fn execute(
        &self,
        reservation: &Reservation,
        terms: CancellationTerms,
    ) -> Result<CancellationOutcome, StoreError> {
        let record = Cancellation::new(
            reservation.id,
            terms.cancelled_by.clone(),
            Some(terms.reason.clone()),
            terms.refund_rate,
            terms.refund_amount,
            terms.is_admin,
        );
        self.cancellations.create_cancellation(&record).await?;

        // The status write is the commit point. Losing the compare-and-swap
        // means another actor cancelled or expired this reservation since
        // the read; the audit row above records the attempt.
        let transitioned = self
            .reservations
            .transition_status(reservation.id, reservation.status, ReservationStatus::Cancelled)
            .await?;
        if !transitioned {
            return Err(format!(
                "reservation {} changed status during cancellation",
                reservation.id
            )
            .into());
        }

        self.schedules
            .release_seats(reservation.schedule_id, reservation.student_count)
            .await?;
        self.cache.invalidate(reservation.schedule_id);

        let refund_status = if terms.refund_amount > 0 {
            self.settle_refund(&record).await?
        } else {
            RefundStatus::Completed
        };

        let message = match (terms.refund_amount, refund_status) {
            (0, _) => "Reservation cancelled. No refund applies.".to_string(),
            (amount, RefundStatus::Completed) => format!(
                "Reservation cancelled. Refunded {} ({:.0}% of {}).",
                amount,
                terms.refund_rate * 100.0,
                reservation.total_price
            ),
            (amount, _) => format!(
                "Reservation cancelled. Refund of {} could not be processed.",
                amount
            ),
        };

        let mut notification_sent = false;
        if terms.notify_user {
            match self.notifier.notify_user(&reservation.user_id, &message).await {
                Ok(()) => {
                    self.cancellations.mark_notification_sent(record.id).await?;
                    notification_sent = true;
                }
                Err(err) => warn!(
                    user_id = %reservation.user_id,
                    error = %err,
                    "cancellation notice not delivered"
                ),
            }
        }

        info!(
            reservation_id = %reservation.id,
            cancellation_id = %record.id,
            cancelled_by = %terms.cancelled_by,
            refund_amount = terms.refund_amount,
            admin = terms.is_admin,
            notification_sent,
            "reservation cancelled"
        );

        Ok(CancellationOutcome {
            success: true,
            reason: None,
            message,
            cancellation_id: Some(record.id),
            refund_rate: terms.refund_rate,
            refund_amount: terms.refund_amount,
            refund_status: Some(refund_status),
        })
    }

    /// Trigger the refund and record the gateway's verdict. COMPLETED only
    /// on a confirmed success report; a declined report or transport error
    /// marks the audit record FAILED.
    async fn settle_refund(&self, record: &Cancellation) -> Result<RefundStatus, StoreError> {
        let status = match self
            .refunds
            .refund(record.reservation_id, record.refund_amount)
            .await
        {
            Ok(RefundStatus::Completed) => RefundStatus::Completed,
            Ok(reported) => {
                warn!(
                    cancellation_id = %record.id,
                    ?reported,
                    "refund gateway declined refund"
                );
                RefundStatus::Failed
            }
            Err(err) => {
                error!(
                    cancellation_id = %record.id,
                    error = %err,
                    "refund gateway unreachable"
                );
                RefundStatus::Failed
            }
        };
        self.cancellations
            .update_refund_status(record.id, status)
            .await?;
        Ok(status)
    }
}

/// Refund double that settles instantly; used by tests and local runs.
pub struct MockRefundGateway {
    declined: bool,
}

impl MockRefundGateway {
    pub fn new() -> Self {
        Self { declined: false }
    }

    /// A gateway that declines every refund.
    pub fn declining() -> Self {
        Self { declined: true }
    }
}

impl Default for MockRefundGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefundGateway for MockRefundGateway {
    async fn refund(&self, _reservation_id: Uuid, _amount: i64) -> Result<RefundStatus, StoreError> {
        if self.declined {
            return Ok(RefundStatus::Failed);
        }
        Ok(RefundStatus::Completed)
    }
}
