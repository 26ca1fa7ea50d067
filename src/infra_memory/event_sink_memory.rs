use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Mutex;

/// Keeps emitted events in memory and logs them.
#[derive(Default)]
pub struct MemoryGrantEventSink {
    events: Mutex<Vec<GrantEvent>>,
}

impl MemoryGrantEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GrantEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl GrantEventSink for MemoryGrantEventSink {
    async fn emit(&self, event: &GrantEvent) -> anyhow::Result<()> {
        tracing::info!(
            event_type = ?event.event_type,
            user_id = %event.user_id,
            client_id = %event.client_id,
            acting_client = %event.acting_client,
            "grant event"
        );
        self.events
            .lock()
            .map_err(|e| anyhow::anyhow!("event buffer poisoned: {e}"))?
            .push(event.clone());
        Ok(())
    }
}
