use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

use crate::api::ApiClient;
use crate::cli::commands::orders::order_row;
use crate::config::ClientConfig;
use crate::live::{spawn_poll, PortfolioRefresher, PushClient, Reconciler, Topic};
use crate::store::Stores;

#[derive(Args)]
pub struct WatchArgs {
    /// Portfolio to watch
    #[arg(long)]
    pub portfolio: i64,

    /// Polling period in seconds (overrides config)
    #[arg(long)]
    pub interval: Option<u64>,
}

/// Live view over one portfolio. Push events and interval polling both
/// land in the shared stores; the screen redraws on every store change.
pub async fn execute(
    api: Arc<ApiClient>,
    stores: Arc<Stores>,
    config: &ClientConfig,
    args: WatchArgs,
) -> Result<()> {
    let push = PushClient::connect(config);
    let _portfolio_sub = push.subscribe(Topic::Portfolio { id: args.portfolio })?;
    let _list_sub = push.subscribe(Topic::PortfolioList)?;

    let reconciler_task = Reconciler::new(stores.clone()).spawn(push.events());

    let period = Duration::from_secs(args.interval.unwrap_or(config.poll_interval_secs));
    let _poll = spawn_poll(
        Arc::new(PortfolioRefresher {
            api: api.clone(),
            stores: stores.clone(),
            portfolio_id: args.portfolio,
        }),
        period,
    );

    info!(portfolio = args.portfolio, "watch started");

    let mut portfolio_changes = stores.portfolios.subscribe();
    let mut order_changes = stores.orders.subscribe();

    render(&stores, args.portfolio);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("watch interrupted");
                break;
            }
            change = portfolio_changes.recv() => {
                match change {
                    Ok(_) => render(&stores, args.portfolio),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            change = order_changes.recv() => {
                match change {
                    Ok(_) => render(&stores, args.portfolio),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    push.disconnect().ok();
    reconciler_task.abort();
    Ok(())
}

fn render(stores: &Stores, portfolio_id: i64) {
    // Clear screen and redraw from the cache
    print!("\x1B[2J\x1B[1;1H");

    let Some(portfolio) = stores.portfolios.get(portfolio_id) else {
        println!("{}", "Waiting for portfolio data...".bright_black().italic());
        return;
    };

    println!("{}", "═".repeat(72).bright_blue());
    println!("{}", portfolio.name.bright_white().bold());
    println!("{}", "═".repeat(72).bright_blue());

    let gains = if portfolio.gains_loss >= Decimal::ZERO {
        format!("+{}", portfolio.gains_loss).bright_green().to_string()
    } else {
        portfolio.gains_loss.to_string().bright_red().to_string()
    };
    println!(
        "balance ${}   value ${}   gain/loss {}",
        portfolio.portfolio_balance, portfolio.portfolio_value, gains
    );

    let mut holdings = stores.holdings.all();
    holdings.retain(|h| h.portfolio_id == portfolio_id);
    holdings.sort_by_key(|h| h.id);
    if !holdings.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Stock", "Qty", "Price"]);
        for holding in &holdings {
            let (name, price) = match &holding.stock {
                Some(stock) => (stock.ticker_symbol.clone(), format!("${}", stock.market_price)),
                None => (format!("#{}", holding.stock_id), "-".to_string()),
            };
            table.add_row(vec![name, holding.quantity.to_string(), price]);
        }
        println!("\n{}", "HOLDINGS".bright_yellow());
        println!("{table}");
    }

    let mut orders = stores.orders.all();
    orders.retain(|o| o.portfolio_id == portfolio_id);
    orders.sort_by_key(|o| o.id);
    if !orders.is_empty() {
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
        println!("\n{}", "ORDERS".bright_yellow());
        println!("{table}");
    }

    println!("\n{}", "Ctrl-C to exit".bright_black());
}
