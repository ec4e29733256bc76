use crate::error::{Error, Result};

use super::model::{ConsumptionPage, ConsumptionRecord};

/// Length of one settlement period in hours, used whenever a record carries
/// no usable interval timestamps.
pub const DEFAULT_INTERVAL_HOURS: f64 = 0.5;

/// Instantaneous power in watts inferred from a single consumption record.
/// The result is never negative and is rounded to 2 decimal places.
pub fn watts_from(record: &ConsumptionRecord) -> Result<f64> {
    let kwh = record
        .consumption
        .ok_or_else(|| Error::Data("consumption value missing or invalid".to_owned()))?;

    let watts = kwh * 1000.0 / interval_hours(record);
    Ok(round_to(watts, 2).max(0.0))
}

/// Sum of all valid consumption values on the page, in kWh. Records with a
/// missing or invalid consumption are skipped silently. The window itself is
/// the URL builder's responsibility; this does not re-check record dates.
pub fn daily_total_kwh(page: &ConsumptionPage) -> f64 {
    let total: f64 = page
        .results
        .iter()
        .filter_map(|record| record.consumption)
        .sum();

    round_to(total, 3).max(0.0)
}

fn interval_hours(record: &ConsumptionRecord) -> f64 {
    match record.window() {
        (Some(start), Some(end)) => {
            let hours = (end - start).num_milliseconds() as f64 / 3_600_000.0;
            if hours > 0.0 {
                hours
            } else {
                DEFAULT_INTERVAL_HOURS
            }
        }
        _ => DEFAULT_INTERVAL_HOURS,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> ConsumptionRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn half_hour_record_converts_to_watts() {
        let record = record(
            r#"{
                "consumption": 0.25,
                "interval_start": "2024-03-15T14:00:00Z",
                "interval_end": "2024-03-15T14:30:00Z"
            }"#,
        );

        assert_eq!(watts_from(&record).unwrap(), 500.0);
    }

    #[test]
    fn missing_interval_falls_back_to_settlement_period() {
        let record = record(r#"{"consumption": 0.1}"#);

        assert_eq!(watts_from(&record).unwrap(), 200.0);
    }

    #[test]
    fn non_positive_interval_falls_back_to_settlement_period() {
        let record = record(
            r#"{
                "consumption": 0.1,
                "interval_start": "2024-03-15T14:30:00Z",
                "interval_end": "2024-03-15T14:00:00Z"
            }"#,
        );

        assert_eq!(watts_from(&record).unwrap(), 200.0);
    }

    #[test]
    fn one_hour_legacy_interval_is_honoured() {
        let record = record(
            r#"{
                "consumption": 0.1,
                "period_start": "2024-03-15T14:00:00Z",
                "period_end": "2024-03-15T15:00:00Z"
            }"#,
        );

        assert_eq!(watts_from(&record).unwrap(), 100.0);
    }

    #[test]
    fn negative_consumption_is_clamped_to_zero() {
        let record = record(r#"{"consumption": -0.1}"#);

        assert_eq!(watts_from(&record).unwrap(), 0.0);
    }

    #[test]
    fn missing_consumption_is_an_error() {
        let record = record(r#"{"interval_start": "2024-03-15T14:00:00Z"}"#);

        assert!(matches!(watts_from(&record), Err(Error::Data(_))));
    }

    #[test]
    fn watts_are_rounded_to_two_decimals() {
        // 0.1 kWh over 45 minutes = 133.333... W
        let record = record(
            r#"{
                "consumption": 0.1,
                "interval_start": "2024-03-15T14:00:00Z",
                "interval_end": "2024-03-15T14:45:00Z"
            }"#,
        );

        assert_eq!(watts_from(&record).unwrap(), 133.33);
    }

    #[test]
    fn daily_total_skips_invalid_records() {
        let page: ConsumptionPage = serde_json::from_str(
            r#"{"results": [
                {"consumption": 0.2},
                {"consumption": "bad"},
                {"consumption": 0.3}
            ]}"#,
        )
        .unwrap();

        assert_eq!(daily_total_kwh(&page), 0.5);
    }

    #[test]
    fn daily_total_is_rounded_to_three_decimals() {
        let page: ConsumptionPage = serde_json::from_str(
            r#"{"results": [
                {"consumption": 0.1114},
                {"consumption": 0.2223}
            ]}"#,
        )
        .unwrap();

        assert_eq!(daily_total_kwh(&page), 0.334);
    }

    #[test]
    fn empty_page_totals_zero() {
        assert_eq!(daily_total_kwh(&ConsumptionPage::default()), 0.0);
    }
}
