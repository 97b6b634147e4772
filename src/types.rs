//! Wire types for the trading backend

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Buy/sell side of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Buy => write!(f, "buy"),
            OrderType::Sell => write!(f, "sell"),
        }
    }
}

/// Order lifecycle state. Transitions are monotonic: `Pending` may become
/// `Executed` or `Cancelled`; the terminal states never revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Executed,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Executed => write!(f, "executed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A user portfolio. `portfolio_value` and `gains_loss` are computed
/// server-side; the client never derives them locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub portfolio_balance: Decimal,
    #[serde(default)]
    pub portfolio_value: Decimal,
    #[serde(default)]
    pub gains_loss: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_investment: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A position inside one portfolio. The backend may nest the owning stock
/// record for display; it is carried verbatim, no client-side join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: i64,
    pub portfolio_id: i64,
    pub stock_id: i64,
    pub quantity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_purchase_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<Stock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub portfolio_id: i64,
    pub stock_id: i64,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub quantity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<Stock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub ticker_symbol: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Authoritative last-known price
    #[serde(default)]
    pub market_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// A named list of stock ids. Membership has no duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub stocks: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cash_balance: Decimal,
}

// --- Response envelopes ---
//
// Collection endpoints nest under the plural key, single-entity endpoints
// under the singular key. The one exception is GET /api/orders, which
// returns a bare array.

#[derive(Debug, Deserialize)]
pub struct PortfolioList {
    pub portfolios: Vec<Portfolio>,
}

#[derive(Debug, Deserialize)]
pub struct PortfolioEnvelope {
    pub portfolio: Portfolio,
}

#[derive(Debug, Deserialize)]
pub struct HoldingList {
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Deserialize)]
pub struct HoldingEnvelope {
    pub holding: Holding,
}

#[derive(Debug, Deserialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub struct OrderEnvelope {
    pub order: Order,
}

/// Response to DELETE /api/orders/:id. The backend cancels instead of
/// deleting, so a full updated record comes back alongside the message.
#[derive(Debug, Deserialize)]
pub struct CancelResponse {
    pub order: Order,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StockList {
    pub stocks: Vec<Stock>,
}

#[derive(Debug, Deserialize)]
pub struct StockEnvelope {
    pub stock: Stock,
}

#[derive(Debug, Deserialize)]
pub struct WatchlistList {
    pub watchlists: Vec<Watchlist>,
}

#[derive(Debug, Deserialize)]
pub struct WatchlistEnvelope {
    pub watchlist: Watchlist,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

// --- Request payloads ---

#[derive(Debug, Clone, Serialize)]
pub struct NewPortfolio {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub portfolio_balance: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PortfolioUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub portfolio_balance: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub portfolio_id: i64,
    pub stock_id: i64,
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderUpdate {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewHolding {
    pub stock_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HoldingUpdate {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWatchlist {
    pub name: String,
}

/// Search filters for GET /api/stocks
#[derive(Debug, Clone, Default, Serialize)]
pub struct StockQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cash_balance: Option<Decimal>,
}
