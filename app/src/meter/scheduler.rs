use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Lower bound on the polling period, bounding the request rate against the
/// upstream API regardless of misconfiguration.
pub const MIN_POLL_SECONDS: u64 = 60;

pub fn effective_poll_interval(configured_seconds: u64) -> Duration {
    Duration::from_secs(configured_seconds.max(MIN_POLL_SECONDS))
}

/// One refresh cycle, driven by the scheduler. Implemented by
/// [`super::service::MeterService`]; failures are handled inside the cycle
/// and never surface here.
#[trait_variant::make(Send)]
pub trait Refresher {
    async fn refresh(&self);
}

impl<R, C> Refresher for super::service::MeterService<R, C>
where
    R: crate::core::DeviceRegistry + Send + Sync,
    C: crate::core::CacheStore + Send + Sync,
{
    async fn refresh(&self) {
        Self::refresh(self).await;
    }
}

/// Per-meter polling timer. Idle until `start`, which refreshes immediately
/// and then once per interval; `stop` cancels the timer but lets an
/// in-flight refresh run to completion.
pub struct PollScheduler {
    cancel: Option<CancellationToken>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self { cancel: None }
    }

    /// No-op when already running.
    pub fn start<S>(&mut self, service: Arc<S>, configured_seconds: u64)
    where
        S: Refresher + Send + Sync + 'static,
    {
        if self.cancel.is_some() {
            tracing::debug!("Poll scheduler already running, ignoring start");
            return;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = effective_poll_interval(configured_seconds);

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = timer.tick() => service.refresh().await,
                }
            }
        });

        self.cancel = Some(token);
    }

    pub fn stop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}
