use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;

use crate::api::{self, ApiClient};
use crate::store::Stores;
use crate::types::{Order, OrderStatus, OrderType};

#[derive(Args)]
pub struct OrdersArgs {
    /// Limit to one portfolio
    #[arg(long)]
    pub portfolio: Option<i64>,
}

pub async fn execute(api: &ApiClient, stores: &Stores, args: OrdersArgs) -> Result<()> {
    match args.portfolio {
        Some(id) => api::orders::load_portfolio_orders(api, stores, id).await,
        None => api::orders::load_orders(api, stores).await,
    }

    let mut orders = stores.orders.all();
    if let Some(id) = args.portfolio {
        orders.retain(|o| o.portfolio_id == id);
    }
    if orders.is_empty() {
        println!("{}", "No orders found".bright_black().italic());
        return Ok(());
    }
    orders.sort_by_key(|o| o.id);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "ID", "Portfolio", "Stock", "Side", "Qty", "Target", "Status", "Executed",
        ]);

    for order in &orders {
        table.add_row(order_row(order));
    }

    println!("{table}");
    Ok(())
}

pub fn order_row(order: &Order) -> Vec<String> {
    let side = match order.order_type {
        OrderType::Buy => "BUY".bright_green().to_string(),
        OrderType::Sell => "SELL".bright_red().to_string(),
    };
    let status = match order.status {
        OrderStatus::Pending => "pending".bright_yellow().to_string(),
        OrderStatus::Executed => "executed".bright_green().to_string(),
        OrderStatus::Cancelled => "cancelled".bright_black().to_string(),
    };
    let stock = order
        .stock
        .as_ref()
        .map(|s| s.ticker_symbol.clone())
        .unwrap_or_else(|| format!("#{}", order.stock_id));
    let target = order
        .target_price
        .map(|p| format!("${p}"))
        .unwrap_or_else(|| "market".to_string());
    let executed = match (order.executed_price, order.executed_at) {
        (Some(price), Some(at)) => format!("${} @ {}", price, at.format("%Y-%m-%d %H:%M")),
        (Some(price), None) => format!("${price}"),
        _ => "-".to_string(),
    };

    vec![
        order.id.to_string(),
        order.portfolio_id.to_string(),
        stock,
        side,
        order.quantity.to_string(),
        target,
        status,
        executed,
    ]
}
