use crate::application_port::AuthError;
use crate::domain_port::Clock;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Wall clock shifted by an adjustable offset, so operators and tests can
/// move server time forward without touching the host clock.
#[derive(Debug, Default)]
pub struct AdjustableClock {
    offset_secs: AtomicI64,
}

fn shifted(base: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(secs).and_then(|delta| base.checked_add_signed(delta))
}

impl AdjustableClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects offsets that move the clock before the Unix epoch or past the
    /// last instant chrono can represent.
    pub fn set_offset(&self, secs: i64) -> Result<(), AuthError> {
        match shifted(Utc::now(), secs) {
            Some(at) if at.timestamp() >= 0 => {}
            _ => return Err(AuthError::InvalidOffset(secs)),
        }
        self.offset_secs.store(secs, Ordering::SeqCst);
        tracing::info!(offset_secs = secs, "clock offset changed");
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        self.offset_secs.load(Ordering::SeqCst)
    }
}

impl Clock for AdjustableClock {
    /// Saturates at the representable bounds instead of overflowing.
    fn now(&self) -> DateTime<Utc> {
        let offset = self.offset();
        shifted(Utc::now(), offset).unwrap_or(if offset < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }
}
