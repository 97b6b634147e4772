//! Stock synchronization thunks

use tracing::warn;

use crate::api::ApiClient;
use crate::store::{Snapshot, Stores};
use crate::types::{StockEnvelope, StockList, StockQuery};

/// Load the stock universe, optionally filtered by ticker or company name.
/// Replaces the collection wholesale: a filtered result is what the search
/// view should display, stale entries and all the rest evicted.
pub async fn load_stocks(api: &ApiClient, stores: &Stores, query: Option<&StockQuery>) {
    let result = match query {
        Some(q) => api.get_json_query::<StockList, _>("api/stocks", q).await,
        None => api.get_json::<StockList>("api/stocks").await,
    };
    match result {
        Ok(data) => stores.apply(Snapshot::Stocks(data.stocks)),
        Err(e) => warn!("stock list refresh failed: {e}"),
    }
}

pub async fn load_stock(api: &ApiClient, stores: &Stores, id: i64) {
    match api.get_json::<StockEnvelope>(&format!("api/stocks/{id}")).await {
        Ok(data) => stores.apply(Snapshot::Stock(data.stock)),
        Err(e) => warn!(stock_id = id, "stock refresh failed: {e}"),
    }
}

/// Load recently viewed stocks. This is a partial collection, so it merges
/// record by record instead of replacing, and cannot evict stocks other
/// views loaded.
pub async fn load_recent_stocks(api: &ApiClient, stores: &Stores) {
    match api.get_json::<StockList>("api/stocks/recent").await {
        Ok(data) => stores.apply(Snapshot::StocksMerged(data.stocks)),
        Err(e) => warn!("recent stock refresh failed: {e}"),
    }
}
