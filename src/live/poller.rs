//! Interval polling
//!
//! Poll loops re-run the REST load thunks on a fixed cadence. They back up
//! the push channel: pending orders execute server-side without a push
//! topic of their own, and a lagged push receiver is repaired by the next
//! cycle. The first tick fires immediately, doubling as the initial load.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::api::{self, ApiClient};
use crate::store::Stores;

/// One poll cycle. Implementations absorb their own failures so a flaky
/// network never kills the loop.
#[async_trait]
pub trait Refresher: Send + Sync + 'static {
    async fn refresh(&self);
}

/// Aborts the poll task on drop, mirroring a view unmount.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Floor for the poll period; `tokio::time::interval` panics on zero.
const MIN_POLL_PERIOD: Duration = Duration::from_secs(1);

pub fn spawn_poll(refresher: Arc<dyn Refresher>, period: Duration) -> PollHandle {
    let period = period.max(MIN_POLL_PERIOD);
    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            debug!("poll cycle");
            refresher.refresh().await;
        }
    });
    PollHandle { task }
}

/// Refreshes the full order list for the current user.
pub struct OrdersRefresher {
    pub api: Arc<ApiClient>,
    pub stores: Arc<Stores>,
}

#[async_trait]
impl Refresher for OrdersRefresher {
    async fn refresh(&self) {
        api::orders::load_orders(&self.api, &self.stores).await;
    }
}

/// Refreshes one portfolio along with its holdings and orders.
pub struct PortfolioRefresher {
    pub api: Arc<ApiClient>,
    pub stores: Arc<Stores>,
    pub portfolio_id: i64,
}

#[async_trait]
impl Refresher for PortfolioRefresher {
    async fn refresh(&self) {
        api::portfolios::load_portfolio(&self.api, &self.stores, self.portfolio_id).await;
        api::holdings::load_portfolio_holdings(&self.api, &self.stores, self.portfolio_id).await;
        api::orders::load_portfolio_orders(&self.api, &self.stores, self.portfolio_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    #[async_trait]
    impl Refresher for Counter {
        async fn refresh(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_fires_immediately() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let _handle = spawn_poll(counter.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_the_configured_cadence() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let _handle = spawn_poll(counter.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_clamped_instead_of_panicking() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let _handle = spawn_poll(counter.clone(), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        // Clamped to the one-second floor, not a busy loop.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_loop() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let handle = spawn_poll(counter.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
