//! Push-event reconciler
//!
//! Drains the push client's event stream and applies each event to the
//! shared stores through the same snapshot path the REST thunks use.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::live::events::{parse_event, PushEvent};
use crate::store::Stores;

pub struct Reconciler {
    stores: Arc<Stores>,
}

impl Reconciler {
    pub fn new(stores: Arc<Stores>) -> Self {
        Self { stores }
    }

    /// Apply one push event to the stores. Malformed or unrecognized
    /// events are logged and dropped.
    pub fn ingest(&self, event: &PushEvent) {
        match parse_event(event) {
            Ok(snapshot) => {
                debug!(event = %event.event, "applying push event");
                self.stores.apply(snapshot);
            }
            Err(e) => warn!(event = %event.event, "ignoring push event: {e}"),
        }
    }

    /// Consume events until the sender side goes away. A lagged receiver
    /// skips ahead; the next poll cycle repairs anything missed.
    pub fn spawn(self, mut events: broadcast::Receiver<PushEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.ingest(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "push event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("push event channel closed");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Portfolio;
    use rust_decimal_macros::dec;

    fn portfolio(id: i64, name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "user_id": 1,
            "name": name,
            "portfolio_balance": 1000.0,
        })
    }

    #[test]
    fn portfolio_update_lands_in_the_store() {
        let stores = Stores::new();
        let reconciler = Reconciler::new(stores.clone());

        reconciler.ingest(&PushEvent {
            event: "portfolio_update".into(),
            data: portfolio(7, "Growth"),
        });

        let cached: Portfolio = stores.portfolios.get(7).unwrap();
        assert_eq!(cached.name, "Growth");
        assert_eq!(cached.portfolio_balance, dec!(1000));
    }

    #[test]
    fn malformed_event_leaves_stores_untouched() {
        let stores = Stores::new();
        let reconciler = Reconciler::new(stores.clone());

        reconciler.ingest(&PushEvent {
            event: "portfolio_update".into(),
            data: serde_json::json!({"id": "not-a-number"}),
        });

        assert!(stores.portfolios.is_empty());
    }

    #[tokio::test]
    async fn spawned_reconciler_drains_the_channel() {
        let stores = Stores::new();
        let (tx, rx) = broadcast::channel(16);
        let handle = Reconciler::new(stores.clone()).spawn(rx);

        tx.send(PushEvent {
            event: "portfolio_update".into(),
            data: portfolio(1, "Income"),
        })
        .unwrap();
        drop(tx);

        handle.await.unwrap();
        assert_eq!(stores.portfolios.len(), 1);
    }
}
