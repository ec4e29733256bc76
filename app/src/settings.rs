use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::adapter::mqtt::Mqtt;
use crate::error::Error;
use crate::meter::{MeterIdentity, MeterSide, urls};

#[derive(Debug, Deserialize)]
#[allow(unused)]
pub struct Settings {
    pub octopus: OctopusSettings,
    pub import: MeterEntry,
    #[serde(default)]
    pub export: Option<MeterEntry>,
    pub mqtt: MqttSettings,
    pub cache: CacheSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("octobridge.toml"))
            .add_source(Environment::default().separator("_").list_separator(","));

        let s = builder.build()?;
        s.try_deserialize()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OctopusSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_poll_seconds() -> u64 {
    300
}

fn default_api_base() -> String {
    urls::OCTOPUS_BASE_URL.to_owned()
}

/// One meter section of the configuration. Fields are optional at parse time;
/// completeness is checked per meter at discovery so an incomplete export
/// section never blocks the import meter.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MeterEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mpan: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
}

impl MeterEntry {
    pub fn identity(&self, side: MeterSide) -> Result<MeterIdentity, Error> {
        let mpan = require(&self.mpan, "mpan", side)?;
        let serial = require(&self.serial, "serial", side)?;

        let name = self
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| match side {
                MeterSide::Import => "Octopus Import".to_owned(),
                MeterSide::Export => "Octopus Export".to_owned(),
            });

        Ok(MeterIdentity {
            mpan,
            serial,
            side,
            name,
        })
    }
}

fn require(field: &Option<String>, what: &str, side: MeterSide) -> Result<String, Error> {
    field
        .clone()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{side} meter is missing {what}")))
}

#[derive(Debug, Deserialize, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub base_topic: String,
}

impl MqttSettings {
    pub fn new_client(&self) -> Mqtt {
        Mqtt::connect(&self.host, self.port, &self.client_id)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub dir: String,
}
