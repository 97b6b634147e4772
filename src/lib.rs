//! Client-side state synchronization for the stockdeck trading backend.
//!
//! The crate keeps a normalized cache of portfolios, holdings, orders,
//! stocks and watchlists in sync with the server over two transports:
//! REST thunks ([`api`]) and a push channel with interval polling as
//! backup ([`live`]). Everything funnels through one snapshot ingestion
//! point ([`store::Stores::apply`]), so the cache converges no matter
//! which transport delivers a change first.

pub mod api;
pub mod chart;
pub mod cli;
pub mod config;
pub mod errors;
pub mod live;
pub mod logging;
pub mod store;
pub mod types;
