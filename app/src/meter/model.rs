use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// One page of consumption records as returned by a single API call. The
/// upstream envelope is `{"results": [...]}`; an absent list deserializes as
/// an empty page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumptionPage {
    #[serde(default)]
    pub results: Vec<ConsumptionRecord>,
}

/// One metered reading over a settlement interval. The interval may be
/// reported as `interval_start`/`interval_end` or under the legacy
/// `period_start`/`period_end` names. All fields are deserialized leniently:
/// a non-numeric consumption or an unparsable timestamp becomes `None`
/// instead of failing the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumptionRecord {
    #[serde(default, deserialize_with = "lenient_kwh")]
    pub consumption: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub interval_start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub interval_end: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub period_start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub period_end: Option<DateTime<Utc>>,
}

impl ConsumptionRecord {
    /// Settlement window of this record, preferring the primary field names
    /// over the legacy ones per field.
    pub fn window(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.interval_start.or(self.period_start),
            self.interval_end.or(self.period_end),
        )
    }
}

fn lenient_kwh<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|kwh| kwh.is_finite()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc));
    Ok(parsed)
}
