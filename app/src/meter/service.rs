use chrono::Utc;
use reqwest::Url;
use tokio::sync::Mutex;

use crate::core::{CacheStore, CachedState, DeviceRegistry, Metric, MetricHandle};
use crate::error::{Error, Result};

use super::MeterIdentity;
use super::client::ConsumptionClient;
use super::{compute, urls};

/// Refresh coordinator for one meter. Runs two independent sub-cycles per
/// refresh (instantaneous power, daily total); a failure in one never aborts
/// the other or any later cycle, it only leaves the cached value untouched.
pub struct MeterService<R, C> {
    meter: MeterIdentity,
    client: ConsumptionClient,
    api_base: Url,
    registry: R,
    cache: C,
    state: Mutex<CachedState>,
    power_handle: Option<MetricHandle>,
    total_handle: Option<MetricHandle>,
    refresh_guard: Mutex<()>,
}

impl<R, C> MeterService<R, C>
where
    R: DeviceRegistry + Sync,
    C: CacheStore + Sync,
{
    /// Restores persisted state, probes the registry for both metrics and
    /// pushes the restored values once.
    pub async fn init(
        meter: MeterIdentity,
        client: ConsumptionClient,
        api_base: Url,
        registry: R,
        cache: C,
    ) -> Self {
        let restored = match cache.load(&meter).await {
            Ok(state) => state.unwrap_or_default().clamped(),
            Err(e) => {
                tracing::warn!("Error restoring cached state for {}: {:?}", meter.name, e);
                CachedState::default()
            }
        };

        let power_handle = registry.register_metric(&meter, Metric::PowerWatts).await;
        if power_handle.is_none() {
            tracing::warn!(
                "Registry does not expose {} for {}, updates will be skipped",
                Metric::PowerWatts,
                meter.name
            );
        }

        let total_handle = registry
            .register_metric(&meter, Metric::TodayKilowattHours)
            .await;
        if total_handle.is_none() {
            tracing::warn!(
                "Registry does not expose {} for {}, updates will be skipped",
                Metric::TodayKilowattHours,
                meter.name
            );
        }

        let service = Self {
            meter,
            client,
            api_base,
            registry,
            cache,
            state: Mutex::new(restored),
            power_handle,
            total_handle,
            refresh_guard: Mutex::new(()),
        };

        service.push_metric(Metric::PowerWatts, restored.watts).await;
        service
            .push_metric(Metric::TodayKilowattHours, restored.total_kwh)
            .await;

        service
    }

    /// One full refresh cycle. Skipped entirely when a previous cycle for
    /// this meter is still in flight, so a slow response can never overwrite
    /// a fresher one.
    pub async fn refresh(&self) {
        let Ok(_guard) = self.refresh_guard.try_lock() else {
            tracing::warn!(
                "Refresh for {} still in progress, skipping this cycle",
                self.meter.name
            );
            return;
        };

        self.refresh_power().await;
        self.refresh_total().await;
    }

    pub async fn cached_state(&self) -> CachedState {
        *self.state.lock().await
    }

    async fn refresh_power(&self) {
        match self.fetch_latest_watts().await {
            Ok(watts) => {
                self.state.lock().await.watts = watts;
                self.push_metric(Metric::PowerWatts, watts).await;
                self.persist_state().await;
                tracing::debug!("{} power updated to {:.2} W", self.meter.name, watts);
            }
            Err(e) => {
                tracing::warn!("Failed to update power for {}: {}", self.meter.name, e);
            }
        }
    }

    async fn refresh_total(&self) {
        match self.fetch_today_total().await {
            Ok(total_kwh) => {
                self.state.lock().await.total_kwh = total_kwh;
                self.push_metric(Metric::TodayKilowattHours, total_kwh).await;
                self.persist_state().await;
                tracing::debug!(
                    "{} total updated to {:.3} kWh (today)",
                    self.meter.name,
                    total_kwh
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to update total consumption for {}: {}",
                    self.meter.name,
                    e
                );
            }
        }
    }

    async fn fetch_latest_watts(&self) -> Result<f64> {
        let url = urls::latest_consumption_url(&self.api_base, &self.meter.mpan, &self.meter.serial);
        let page = self.client.fetch(url).await?;

        let record = page
            .results
            .first()
            .ok_or_else(|| Error::Data("no consumption records returned".to_owned()))?;

        compute::watts_from(record)
    }

    async fn fetch_today_total(&self) -> Result<f64> {
        let url = urls::today_consumption_url(
            &self.api_base,
            &self.meter.mpan,
            &self.meter.serial,
            Utc::now(),
            urls::DEFAULT_PAGE_SIZE,
        );
        let page = self.client.fetch(url).await?;

        Ok(compute::daily_total_kwh(&page))
    }

    async fn push_metric(&self, metric: Metric, value: f64) {
        let handle = match metric {
            Metric::PowerWatts => &self.power_handle,
            Metric::TodayKilowattHours => &self.total_handle,
        };

        if let Some(handle) = handle
            && let Err(e) = self.registry.update_metric(handle, value).await
        {
            tracing::warn!("Failed to push {} for {}: {:?}", metric, self.meter.name, e);
        }
    }

    async fn persist_state(&self) {
        let snapshot = *self.state.lock().await;
        if let Err(e) = self.cache.save(&self.meter, &snapshot).await {
            tracing::warn!("Error persisting cached state for {}: {:?}", self.meter.name, e);
        }
    }
}
