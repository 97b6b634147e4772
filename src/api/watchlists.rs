//! Watchlist synchronization thunks
//!
//! Membership changes (add/remove stock) patch the cached record by
//! constructing a new one and upserting it; the store never sees a partial
//! field mutation.

use tracing::warn;

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::store::{Snapshot, Stores};
use crate::types::{NewWatchlist, Watchlist, WatchlistEnvelope, WatchlistList};

#[derive(serde::Serialize)]
struct StockRef {
    stock_id: i64,
}

pub async fn load_watchlists(api: &ApiClient, stores: &Stores) {
    match api.get_json::<WatchlistList>("api/users/watchlists").await {
        Ok(data) => stores.apply(Snapshot::Watchlists(data.watchlists)),
        Err(e) => warn!("watchlist refresh failed: {e}"),
    }
}

pub async fn create_watchlist(
    api: &ApiClient,
    stores: &Stores,
    payload: &NewWatchlist,
) -> Result<Watchlist, ApiError> {
    let data: WatchlistEnvelope = api.post_json("api/watchlists", payload).await?;
    stores.apply(Snapshot::Watchlist(data.watchlist.clone()));
    Ok(data.watchlist)
}

pub async fn update_watchlist(
    api: &ApiClient,
    stores: &Stores,
    id: i64,
    payload: &NewWatchlist,
) -> Result<Watchlist, ApiError> {
    let data: WatchlistEnvelope = api.put_json(&format!("api/watchlists/{id}"), payload).await?;
    stores.apply(Snapshot::Watchlist(data.watchlist.clone()));
    Ok(data.watchlist)
}

pub async fn delete_watchlist(api: &ApiClient, stores: &Stores, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("api/watchlists/{id}")).await?;
    stores.apply(Snapshot::WatchlistRemoved(id));
    Ok(())
}

/// Add a stock to a watchlist. On success the cached membership list is
/// rebuilt with the stock appended; duplicates are not introduced.
pub async fn add_stock_to_watchlist(
    api: &ApiClient,
    stores: &Stores,
    watchlist_id: i64,
    stock_id: i64,
) -> Result<(), ApiError> {
    api.post_json::<serde_json::Value, _>(
        &format!("api/watchlists/{watchlist_id}/stocks"),
        &StockRef { stock_id },
    )
    .await?;

    if let Some(mut watchlist) = stores.watchlists.get(watchlist_id) {
        if !watchlist.stocks.contains(&stock_id) {
            watchlist.stocks.push(stock_id);
            stores.apply(Snapshot::Watchlist(watchlist));
        }
    }
    Ok(())
}

pub async fn remove_stock_from_watchlist(
    api: &ApiClient,
    stores: &Stores,
    watchlist_id: i64,
    stock_id: i64,
) -> Result<(), ApiError> {
    api.delete(&format!("api/watchlists/{watchlist_id}/stocks/{stock_id}"))
        .await?;

    if let Some(mut watchlist) = stores.watchlists.get(watchlist_id) {
        watchlist.stocks.retain(|&id| id != stock_id);
        stores.apply(Snapshot::Watchlist(watchlist));
    }
    Ok(())
}
