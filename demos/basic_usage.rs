//! Look up a counterparty and list its recent customer orders.
//!
//! Run:
//! `MOYSKLAD_TOKEN=<token> cargo run --example basic_usage -- <inn>`

use moysklad_client::{ClientConfig, Direction, Entity, MoySklad};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(token) = std::env::var("MOYSKLAD_TOKEN") else {
        eprintln!("Set MOYSKLAD_TOKEN before running this example.");
        std::process::exit(2);
    };
    let inn = std::env::args().nth(1).unwrap_or_else(|| "7736207543".to_owned());

    let client = MoySklad::new(&ClientConfig::new(token))?;

    let counterparties = client.counterparties.find_by_inn(&inn).await?;
    let Some(counterparty) = counterparties.first() else {
        println!("no counterparty with INN {inn}");
        return Ok(());
    };
    let Some(agent_id) = counterparty.entity_id() else {
        return Ok(());
    };
    println!("{} ({agent_id})", counterparty.name().unwrap_or("unnamed"));

    let query = client
        .customer_orders
        .query()
        .order_by("moment", Direction::Desc)
        .limit(5);
    let orders = client.customer_orders.find_by_agent(&agent_id, Some(query)).await?;
    for order in &orders.rows {
        println!(
            "  {} sum={}",
            order.name().unwrap_or("-"),
            order.document.sum.unwrap_or_default()
        );
    }
    Ok(())
}
