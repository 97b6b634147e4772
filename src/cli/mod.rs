//! Command-line interface
//!
//! Uses clap for argument parsing and a structured command pattern: each
//! subcommand lives in its own file under `commands/` with an `Args`
//! struct and an `execute` function.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

pub mod commands;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::logging::{init_logging, LogMode, LoggingConfig};
use crate::store::Stores;

use commands::orders::OrdersArgs;
use commands::portfolios::PortfoliosArgs;
use commands::stocks::StocksArgs;
use commands::watch::WatchArgs;

#[derive(Parser)]
#[command(name = "stockdeck")]
#[command(version)]
#[command(about = "Terminal client for the stockdeck trading backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// REST API base URL (default: http://localhost:8000)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Push channel URL (default: ws://localhost:8000/ws)
    #[arg(long, global = true)]
    pub push_url: Option<String>,

    /// Directory for session log files
    #[arg(long, global = true, default_value = "logs")]
    pub log_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the current user's portfolios
    Portfolios(PortfoliosArgs),

    /// List orders, optionally scoped to one portfolio
    Orders(OrdersArgs),

    /// Browse and search stocks
    Stocks(StocksArgs),

    /// Watch one portfolio live (push channel + polling)
    Watch(WatchArgs),
}

impl Cli {
    fn build_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.api_url {
            config = config.with_base_url(url)?;
        }
        if let Some(url) = &self.push_url {
            config = config.with_push_url(url)?;
        }
        Ok(config)
    }

    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        // The watch view owns the terminal, so its logs go to file only.
        let mode = match self.command {
            Commands::Watch(_) => LogMode::FileOnly,
            _ => LogMode::ConsoleAndFile,
        };
        init_logging(LoggingConfig::new(mode, &self.log_dir))?;

        let config = self.build_config()?;
        let stores = Stores::new();
        let api = Arc::new(ApiClient::new(&config)?);

        match self.command {
            Commands::Portfolios(args) => {
                commands::portfolios::execute(&api, &stores, args).await
            }
            Commands::Orders(args) => commands::orders::execute(&api, &stores, args).await,
            Commands::Stocks(args) => commands::stocks::execute(&api, &stores, args).await,
            Commands::Watch(args) => commands::watch::execute(api, stores, &config, args).await,
        }
    }
}
