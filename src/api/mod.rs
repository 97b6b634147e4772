//! REST synchronization layer
//!
//! One module per entity type, each a set of thunks that perform a network
//! call and translate the outcome into a store mutation. Reads absorb
//! failures and leave the stale cache in place (polling retries them);
//! writes return the normalized [`crate::errors::ApiError`] to the caller.

mod client;
pub mod holdings;
pub mod orders;
pub mod portfolios;
pub mod stocks;
pub mod users;
pub mod watchlists;

pub use client::ApiClient;
