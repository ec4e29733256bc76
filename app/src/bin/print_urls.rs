use chrono::Utc;
use reqwest::Url;

use octobridge::meter::urls;

/// Prints the consumption URLs for a meter, for poking the API by hand.
fn main() {
    let mut args = std::env::args().skip(1);
    let (Some(mpan), Some(serial)) = (args.next(), args.next()) else {
        eprintln!("Usage: print-urls <MPAN> <SERIAL>");
        std::process::exit(1);
    };

    let base = Url::parse(urls::OCTOPUS_BASE_URL).expect("default base URL is well-formed");

    println!("Latest: {}", urls::latest_consumption_url(&base, &mpan, &serial));
    println!(
        "Today: {}",
        urls::today_consumption_url(&base, &mpan, &serial, Utc::now(), urls::DEFAULT_PAGE_SIZE)
    );
}
