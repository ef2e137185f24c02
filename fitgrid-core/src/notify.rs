use async_trait::async_trait;

use crate::StoreError;

/// Outbound notification collaborator. Delivery channels (push, SMS, email)
/// live outside this core; failures here never fail a business operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_user(&self, user_id: &str, message: &str) -> Result<(), StoreError>;
}

/// Notifier for deployments without a notification channel.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_user(&self, _user_id: &str, _message: &str) -> Result<(), StoreError> {
        Ok(())
    }
}
