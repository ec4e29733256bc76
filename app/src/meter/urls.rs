use chrono::{DateTime, Utc};
use reqwest::Url;

pub const OCTOPUS_BASE_URL: &str = "https://api.octopus.energy";
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// URL requesting the single most recent consumption record for a meter.
pub fn latest_consumption_url(base: &Url, mpan: &str, serial: &str) -> Url {
    let mut url = consumption_endpoint(base, mpan, serial);
    url.query_pairs_mut()
        .append_pair("page_size", "1")
        .append_pair("order_by", "-period");
    url
}

/// URL requesting all consumption records from UTC midnight of `now`'s
/// calendar date onwards, oldest first. `now` is injected so the window is
/// deterministic in tests.
pub fn today_consumption_url(
    base: &Url,
    mpan: &str,
    serial: &str,
    now: DateTime<Utc>,
    page_size: u32,
) -> Url {
    let start = start_of_utc_day(now);

    let mut url = consumption_endpoint(base, mpan, serial);
    url.query_pairs_mut()
        .append_pair("page_size", &page_size.to_string())
        .append_pair("order_by", "period")
        .append_pair(
            "period_from",
            &start.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        );
    url
}

fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight exists on every date")
        .and_utc()
}

fn consumption_endpoint(base: &Url, mpan: &str, serial: &str) -> Url {
    let mut url = base.clone();
    url.path_segments_mut()
        .expect("API base URL must be a valid base")
        .pop_if_empty()
        .extend([
            "v1",
            "electricity-meter-points",
            mpan.trim(),
            "meters",
            serial.trim(),
            "consumption",
            // trailing slash
            "",
        ]);
    url
}
