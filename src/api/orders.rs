//! Order synchronization thunks

use tracing::warn;

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::store::{Snapshot, Stores};
use crate::types::{CancelResponse, NewOrder, Order, OrderEnvelope, OrderList, OrderUpdate};

/// Load every order for the current user across all portfolios.
///
/// Unlike every other collection endpoint, GET /api/orders returns a bare
/// JSON array instead of `{ "orders": [...] }`.
pub async fn load_orders(api: &ApiClient, stores: &Stores) {
    match api.get_json::<Vec<Order>>("api/orders").await {
        Ok(orders) => stores.apply(Snapshot::Orders(orders)),
        Err(e) => warn!("order list refresh failed: {e}"),
    }
}

/// Load the orders of one portfolio; this one uses the plural envelope.
pub async fn load_portfolio_orders(api: &ApiClient, stores: &Stores, portfolio_id: i64) {
    match api
        .get_json::<OrderList>(&format!("api/portfolios/{portfolio_id}/orders"))
        .await
    {
        Ok(data) => stores.apply(Snapshot::Orders(data.orders)),
        Err(e) => warn!(portfolio_id, "portfolio order refresh failed: {e}"),
    }
}

pub async fn load_order(api: &ApiClient, stores: &Stores, id: i64) {
    match api.get_json::<OrderEnvelope>(&format!("api/orders/{id}")).await {
        Ok(data) => stores.apply(Snapshot::Order(data.order)),
        Err(e) => warn!(order_id = id, "order refresh failed: {e}"),
    }
}

pub async fn create_order(
    api: &ApiClient,
    stores: &Stores,
    payload: &NewOrder,
) -> Result<Order, ApiError> {
    let data: OrderEnvelope = api.post_json("api/orders", payload).await?;
    stores.apply(Snapshot::Order(data.order.clone()));
    Ok(data.order)
}

pub async fn update_order(
    api: &ApiClient,
    stores: &Stores,
    id: i64,
    payload: &OrderUpdate,
) -> Result<Order, ApiError> {
    let data: OrderEnvelope = api.put_json(&format!("api/orders/{id}"), payload).await?;
    stores.apply(Snapshot::Order(data.order.clone()));
    Ok(data.order)
}

/// Cancel an order. The backend transitions its status to `cancelled`
/// rather than deleting it, so the returned record is upserted and the
/// entry never leaves the store.
pub async fn cancel_order(api: &ApiClient, stores: &Stores, id: i64) -> Result<Order, ApiError> {
    let data: CancelResponse = api.delete_json(&format!("api/orders/{id}")).await?;
    stores.apply(Snapshot::Order(data.order.clone()));
    Ok(data.order)
}
