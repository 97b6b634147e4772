//! Push-channel topics and event payloads

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::Snapshot;

/// A subscription target on the push channel. The server emits the full
/// updated record for every change under a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topic {
    Portfolio { id: i64 },
    Stock { id: i64 },
    PortfolioList,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Portfolio { id } => write!(f, "portfolio/{id}"),
            Topic::Stock { id } => write!(f, "stock/{id}"),
            Topic::PortfolioList => write!(f, "portfolio_list"),
        }
    }
}

/// Outgoing subscribe/unsubscribe frame.
#[derive(Debug, Serialize)]
pub struct TopicFrame<'a> {
    pub action: &'a str,
    pub topic: &'a Topic,
}

/// Incoming push frame: an event name plus the full updated record.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Error, Debug)]
pub enum EventParseError {
    #[error("unknown push event {0:?}")]
    UnknownEvent(String),
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Translate a push event into the same snapshot a REST thunk would apply.
pub fn parse_event(event: &PushEvent) -> Result<Snapshot, EventParseError> {
    match event.event.as_str() {
        "portfolio_update" => Ok(Snapshot::Portfolio(serde_json::from_value(
            event.data.clone(),
        )?)),
        "portfolio_list_update" => Ok(Snapshot::Portfolios(serde_json::from_value(
            event.data.clone(),
        )?)),
        "holding_update" => Ok(Snapshot::Holding(serde_json::from_value(event.data.clone())?)),
        "order_update" => Ok(Snapshot::Order(serde_json::from_value(event.data.clone())?)),
        "stock_update" => Ok(Snapshot::Stock(serde_json::from_value(event.data.clone())?)),
        other => Err(EventParseError::UnknownEvent(other.to_string())),
    }
}
