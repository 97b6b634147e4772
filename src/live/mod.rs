//! Live-update reconciliation
//!
//! Two transports feed the same stores: a push channel carrying full-record
//! change events, and interval polling that re-issues the REST load thunks.
//! Both reduce to the idempotent snapshot application in
//! [`crate::store::Stores::apply`], so they are safe to run concurrently.

pub mod client;
pub mod events;
pub mod poller;
pub mod reconciler;

pub use client::{PushClient, PushError, Subscription};
pub use events::{PushEvent, Topic};
pub use poller::{spawn_poll, OrdersRefresher, PollHandle, PortfolioRefresher, Refresher};
pub use reconciler::Reconciler;
