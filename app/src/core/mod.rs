use serde::{Deserialize, Serialize};

use crate::meter::MeterIdentity;

/// Metrics derived per meter and pushed to the device registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Metric {
    #[display("power_watts")]
    PowerWatts,
    #[display("today_kwh")]
    TodayKilowattHours,
}

/// Last-known-good values for one meter. Zero-initialised at registration
/// and mutated only after a fully successful computation, so a failed cycle
/// can leave stale values behind but never incorrect ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedState {
    pub watts: f64,
    pub total_kwh: f64,
}

impl CachedState {
    /// Copy with both values floored at zero. Negative readings are never
    /// propagated, no matter what a cache file claims.
    pub fn clamped(self) -> Self {
        Self {
            watts: self.watts.max(0.0),
            total_kwh: self.total_kwh.max(0.0),
        }
    }
}

/// Opaque handle returned by a successful metric registration. What it
/// carries is up to the registry implementation (for MQTT it is the topic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricHandle(pub String);

/// Push contract towards the host device registry. Registration is a
/// capability probe: `None` means the registry cannot expose this metric,
/// which is a normal, non-fatal outcome; updates for it are then skipped.
#[trait_variant::make(Send)]
pub trait DeviceRegistry {
    async fn register_metric(&self, meter: &MeterIdentity, metric: Metric) -> Option<MetricHandle>;

    async fn update_metric(&self, handle: &MetricHandle, value: f64) -> anyhow::Result<()>;
}

/// Persistence for cached state across process restarts. Loaded once at
/// meter registration and written after every successful cycle; the
/// in-memory state stays the source of truth during a run.
#[trait_variant::make(Send)]
pub trait CacheStore {
    async fn load(&self, meter: &MeterIdentity) -> anyhow::Result<Option<CachedState>>;

    async fn save(&self, meter: &MeterIdentity, state: &CachedState) -> anyhow::Result<()>;
}
