//! Fetch every non-archived product, following `nextHref` across pages.
//!
//! Run:
//! `MOYSKLAD_TOKEN=<token> cargo run --example paginate_products`
//!
//! Optional env vars:
//! - `MOYSKLAD_PAGE_SIZE` (defaults to `100`)

use moysklad_client::{ClientConfig, Entity, MoySklad};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(token) = std::env::var("MOYSKLAD_TOKEN") else {
        eprintln!("Set MOYSKLAD_TOKEN before running this example.");
        std::process::exit(2);
    };
    let page_size = std::env::var("MOYSKLAD_PAGE_SIZE")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(100);

    let client = MoySklad::new(&ClientConfig::new(token))?;
    let query = client.products.query().eq("archived", false).limit(page_size);
    let products = client.products.fetch_all(Some(&query)).await?;

    for product in &products {
        println!(
            "{:<40} {}",
            product.name().unwrap_or("-"),
            product.article.as_deref().unwrap_or("")
        );
    }
    println!("{} products", products.len());
    Ok(())
}
