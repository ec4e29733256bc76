use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::{DeviceRegistry, Metric, MetricHandle};
use crate::meter::MeterIdentity;

use super::mqtt::MqttSender;

/// Device registry backed by retained MQTT messages, one topic per metric:
/// `{base_topic}/{side}/{metric}`. Unchanged values are not re-published.
pub struct MqttRegistry {
    sender: MqttSender,
    base_topic: String,
    last_sent: Mutex<HashMap<String, String>>,
}

impl MqttRegistry {
    pub fn new(sender: MqttSender, base_topic: impl Into<String>) -> Self {
        Self {
            sender,
            base_topic: base_topic.into(),
            last_sent: Mutex::new(HashMap::new()),
        }
    }
}

impl DeviceRegistry for MqttRegistry {
    async fn register_metric(&self, meter: &MeterIdentity, metric: Metric) -> Option<MetricHandle> {
        Some(MetricHandle(format!(
            "{}/{}/{}",
            self.base_topic, meter.side, metric
        )))
    }

    async fn update_metric(&self, handle: &MetricHandle, value: f64) -> anyhow::Result<()> {
        let payload = value.to_string();

        {
            let last_sent = self.last_sent.lock().expect("last_sent lock poisoned");
            if last_sent.get(&handle.0) == Some(&payload) {
                return Ok(());
            }
        }

        self.sender
            .send_retained(handle.0.clone(), payload.clone())
            .await?;

        // recorded only once the publish went through, so a failed send is
        // retried on the next update
        self.last_sent
            .lock()
            .expect("last_sent lock poisoned")
            .insert(handle.0.clone(), payload);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::mqtt::Mqtt;
    use super::*;
    use crate::meter::MeterSide;

    fn meter(side: MeterSide, name: &str) -> MeterIdentity {
        MeterIdentity {
            mpan: "1200023305123".to_owned(),
            serial: "21J0099999".to_owned(),
            side,
            name: name.to_owned(),
        }
    }

    #[tokio::test]
    async fn topics_are_derived_from_meter_side_and_metric() {
        let mqtt = Mqtt::connect("localhost", 1883, "octobridge-test");
        let registry = MqttRegistry::new(mqtt.sender(), "octobridge/meter");

        let handle = registry
            .register_metric(&meter(MeterSide::Export, "Octopus Export"), Metric::PowerWatts)
            .await
            .unwrap();

        assert_eq!(handle.0, "octobridge/meter/export/power_watts");
    }

    // without a broker, publishes still queue fine on the client; dropping
    // the connection closes the queue and makes every publish attempt fail
    #[tokio::test]
    async fn unchanged_values_are_not_republished() {
        let mqtt = Mqtt::connect("localhost", 1883, "octobridge-test-dedupe");
        let registry = MqttRegistry::new(mqtt.sender(), "octobridge/meter");

        let handle = registry
            .register_metric(&meter(MeterSide::Import, "Octopus Import"), Metric::PowerWatts)
            .await
            .unwrap();

        registry.update_metric(&handle, 500.0).await.unwrap();

        drop(mqtt);
        // same value: deduped, no publish attempted
        assert!(registry.update_metric(&handle, 500.0).await.is_ok());
        // changed value: must hit the dead queue
        assert!(registry.update_metric(&handle, 600.0).await.is_err());
    }

    #[tokio::test]
    async fn failed_publish_is_retried_on_the_next_update() {
        let mqtt = Mqtt::connect("localhost", 1883, "octobridge-test-retry");
        let sender = mqtt.sender();
        drop(mqtt);

        let registry = MqttRegistry::new(sender, "octobridge/meter");
        let handle = registry
            .register_metric(&meter(MeterSide::Import, "Octopus Import"), Metric::PowerWatts)
            .await
            .unwrap();

        assert!(registry.update_metric(&handle, 500.0).await.is_err());
        // the failed value was not recorded as sent, so the retry is a real
        // publish attempt, not a dedupe hit
        assert!(registry.update_metric(&handle, 500.0).await.is_err());
    }
}
