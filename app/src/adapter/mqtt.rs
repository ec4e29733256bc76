use std::sync::Arc;

use rumqttc::v5::{AsyncClient, EventLoop, MqttOptions, mqttbytes::QoS};

/// Publish-only MQTT connection. The event loop must be driven via [`Mqtt::run`]
/// for queued publishes to actually go out.
pub struct Mqtt {
    client: Arc<AsyncClient>,
    event_loop: EventLoop,
}

impl Mqtt {
    pub fn connect(host: &str, port: u16, client_id: &str) -> Self {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(std::time::Duration::from_secs(5));

        let (client, event_loop) = AsyncClient::new(options, 10);

        Self {
            client: Arc::new(client),
            event_loop,
        }
    }

    pub fn sender(&self) -> MqttSender {
        MqttSender::new(self.client.clone())
    }

    pub async fn run(mut self) {
        loop {
            if let Err(e) = self.event_loop.poll().await {
                tracing::error!("MQTT error: {}", e);
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
}

#[derive(Clone)]
pub struct MqttSender {
    client: Arc<AsyncClient>,
}

impl MqttSender {
    fn new(client: Arc<AsyncClient>) -> Self {
        Self { client }
    }

    pub async fn send_retained(
        &self,
        topic: impl Into<String>,
        payload: impl Into<String>,
    ) -> anyhow::Result<()> {
        let topic = topic.into();
        let payload = payload.into();

        tracing::debug!("Publishing MQTT message to {}: {:?}", topic, payload);

        self.client
            .publish(topic.clone(), QoS::AtLeastOnce, true, payload)
            .await
            .map_err(|e| {
                tracing::error!("Error publishing MQTT message to {}: {}", topic, e);
                e.into()
            })
    }
}
