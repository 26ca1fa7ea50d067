use crate::domain_model::*;

/// Receives grant lifecycle events for auditing. Delivery failures are the
/// caller's to log; they never undo the state change that produced the event.
#[async_trait::async_trait]
pub trait GrantEventSink: Send + Sync {
    async fn emit(&self, event: &GrantEvent) -> anyhow::Result<()>;
}
