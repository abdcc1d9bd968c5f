//! Raw blocking request against any endpoint.
//!
//! Run:
//! `MOYSKLAD_TOKEN=<token> cargo run --example blocking_request -- entity/store`
//!
//! Optional env vars:
//! - `MOYSKLAD_BASE_URL` (defaults to the production API)

use moysklad_client::{BlockingApiClient, ClientConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(token) = std::env::var("MOYSKLAD_TOKEN") else {
        eprintln!("Set MOYSKLAD_TOKEN before running this example.");
        std::process::exit(2);
    };
    let path = std::env::args().nth(1).unwrap_or_else(|| "entity/store".to_owned());

    let mut config = ClientConfig::new(token);
    if let Ok(base_url) = std::env::var("MOYSKLAD_BASE_URL") {
        config = config.with_base_url(base_url);
    }

    let client = BlockingApiClient::new(&config)?;
    let value = client.get_json(&path, &[("limit".to_owned(), "10".to_owned())])?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
