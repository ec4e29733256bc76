use std::sync::Arc;

use reqwest::Url;
use tracing_subscriber::EnvFilter;

use octobridge::adapter::cache::JsonFileCache;
use octobridge::adapter::mqtt::MqttSender;
use octobridge::adapter::registry::MqttRegistry;
use octobridge::meter::client::ConsumptionClient;
use octobridge::meter::scheduler::PollScheduler;
use octobridge::meter::service::MeterService;
use octobridge::meter::{MeterIdentity, MeterSide};
use octobridge::settings::Settings;

#[tokio::main(flavor = "current_thread")]
pub async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().expect("Error reading configuration");

    let mqtt = settings.mqtt.new_client();
    let sender = mqtt.sender();

    let mut schedulers = discover_meters(&settings, &sender).await;
    if schedulers.is_empty() {
        tracing::warn!("No meters registered, nothing will be polled");
    }

    tokio::select!(
        _ = mqtt.run() => {},
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested, stopping pollers");
            for scheduler in &mut schedulers {
                scheduler.stop();
            }
        },
    );
}

/// Builds and starts one poller per configured meter. A configuration error
/// disables that meter only; the process stays up either way.
async fn discover_meters(settings: &Settings, sender: &MqttSender) -> Vec<PollScheduler> {
    let Some(api_key) = settings
        .octopus
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
    else {
        tracing::error!("Missing api_key in configuration, meter discovery halted");
        return vec![];
    };

    let api_base = match Url::parse(&settings.octopus.api_base) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Invalid API base URL {:?}: {}", settings.octopus.api_base, e);
            return vec![];
        }
    };

    let mut schedulers = Vec::new();

    match settings.import.identity(MeterSide::Import) {
        Ok(meter) => {
            schedulers.push(start_meter(meter, api_key, &api_base, settings, sender).await);
        }
        Err(e) => tracing::error!("Import meter not registered: {}", e),
    }

    if let Some(export) = &settings.export {
        match export.identity(MeterSide::Export) {
            Ok(meter) => {
                schedulers.push(start_meter(meter, api_key, &api_base, settings, sender).await);
            }
            Err(e) => tracing::warn!("Export configuration incomplete, skipping: {}", e),
        }
    }

    schedulers
}

async fn start_meter(
    meter: MeterIdentity,
    api_key: &str,
    api_base: &Url,
    settings: &Settings,
    sender: &MqttSender,
) -> PollScheduler {
    tracing::info!("Registering {} meter {}", meter.side, meter.name);

    let registry = MqttRegistry::new(sender.clone(), settings.mqtt.base_topic.clone());
    let cache = JsonFileCache::new(settings.cache.dir.clone());

    let service = MeterService::init(
        meter,
        ConsumptionClient::new(api_key),
        api_base.clone(),
        registry,
        cache,
    )
    .await;

    let mut scheduler = PollScheduler::new();
    scheduler.start(Arc::new(service), settings.octopus.poll_seconds);
    scheduler
}
