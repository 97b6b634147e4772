use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;

use crate::api::{self, ApiClient};
use crate::store::Stores;

#[derive(Args)]
pub struct PortfoliosArgs {}

pub async fn execute(api: &ApiClient, stores: &Stores, _args: PortfoliosArgs) -> Result<()> {
    api::portfolios::load_portfolios(api, stores).await;

    let mut portfolios = stores.portfolios.all();
    if portfolios.is_empty() {
        println!("{}", "No portfolios found".bright_black().italic());
        return Ok(());
    }
    portfolios.sort_by_key(|p| p.id);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Name", "Balance", "Value", "Gain/Loss"]);

    for portfolio in &portfolios {
        let gains = if portfolio.gains_loss >= Decimal::ZERO {
            format!("+{}", portfolio.gains_loss).bright_green().to_string()
        } else {
            portfolio.gains_loss.to_string().bright_red().to_string()
        };
        table.add_row(vec![
            portfolio.id.to_string(),
            portfolio.name.clone(),
            format!("${}", portfolio.portfolio_balance),
            format!("${}", portfolio.portfolio_value),
            gains,
        ]);
    }

    println!("{table}");
    Ok(())
}
