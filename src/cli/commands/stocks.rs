use anyhow::Result;
use chrono::Utc;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;

use crate::api::{self, ApiClient};
use crate::chart::{price_series, AxisBounds, TimeRange};
use crate::store::Stores;
use crate::types::StockQuery;

#[derive(Args)]
pub struct StocksArgs {
    /// Filter by ticker symbol prefix
    #[arg(long)]
    pub ticker: Option<String>,

    /// Filter by company name substring
    #[arg(long)]
    pub company: Option<String>,

    /// Render a price chart summary for the matched stock
    /// (one of 1D, 1W, 1M, 3M, YTD, 1Y, ALL)
    #[arg(long)]
    pub range: Option<String>,
}

pub async fn execute(api: &ApiClient, stores: &Stores, args: StocksArgs) -> Result<()> {
    let query = StockQuery {
        ticker: args.ticker.clone(),
        company: args.company.clone(),
    };
    let filtered = query.ticker.is_some() || query.company.is_some();
    api::stocks::load_stocks(api, stores, filtered.then_some(&query)).await;

    let mut stocks = stores.stocks.all();
    if stocks.is_empty() {
        println!("{}", "No stocks found".bright_black().italic());
        return Ok(());
    }
    stocks.sort_by(|a, b| a.ticker_symbol.cmp(&b.ticker_symbol));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Ticker", "Company", "Sector", "Price"]);

    for stock in &stocks {
        table.add_row(vec![
            stock.ticker_symbol.bright_white().to_string(),
            stock.company_name.clone(),
            stock.sector.clone().unwrap_or_else(|| "-".to_string()),
            format!("${}", stock.market_price),
        ]);
    }

    println!("{table}");

    if let Some(token) = &args.range {
        let range = TimeRange::from_token(token)
            .ok_or_else(|| anyhow::anyhow!("unknown chart range: {token}"))?;
        if stocks.len() != 1 {
            anyhow::bail!("chart needs exactly one matching stock, found {}", stocks.len());
        }
        render_chart_summary(&stocks[0], range);
    }

    Ok(())
}

fn render_chart_summary(stock: &crate::types::Stock, range: TimeRange) {
    let series = price_series(stock.market_price, range, Utc::now());
    let mut bounds = AxisBounds::new();
    bounds.observe_series(&series);

    println!(
        "\n{} {} chart ({} samples)",
        stock.ticker_symbol.bright_white(),
        range,
        series.len()
    );
    if let Some((lo, hi)) = bounds.padded(0.05) {
        println!("axis: {lo:.2} .. {hi:.2}");
    }
    for point in &series {
        println!("{}  {:.2}", point.at.format("%Y-%m-%d %H:%M"), point.value);
    }
}
