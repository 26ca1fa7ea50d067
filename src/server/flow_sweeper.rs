use crate::application_port::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodically drops consent prompts nobody answered.
pub struct FlowSweeper {
    authorization_service: Arc<dyn AuthorizationService>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl FlowSweeper {
    pub fn new(
        authorization_service: Arc<dyn AuthorizationService>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            authorization_service,
            interval,
            cancellation_token,
        }
    }

    async fn tick_once(&self) {
        tokio::time::sleep(self.interval).await;
        let swept = self.authorization_service.sweep_expired_flows().await;
        if swept > 0 {
            tracing::debug!(swept, "expired consent flows dropped");
        }
    }

    pub async fn run(&self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("flow sweeper shutting down...");
                    break;
                }
                _ = self.tick_once() => {}
            }
        }
    }
}
