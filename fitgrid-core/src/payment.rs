use async_trait::async_trait;
use uuid::Uuid;

use crate::StoreError;
use fitgrid_shared::RefundStatus;

/// Payment collaborator: executes refunds for cancelled reservations.
///
/// The gateway reports its own verdict; transport failures are `Err`. The
/// caller records COMPLETED only on a confirmed success report.
#[async_trait]
pub trait RefundGateway: Send + Sync {
    async fn refund(&self, reservation_id: Uuid, amount: i64) -> Result<RefundStatus, StoreError>;
}
