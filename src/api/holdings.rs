//! Holding synchronization thunks

use tracing::warn;

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::store::{Snapshot, Stores};
use crate::types::{Holding, HoldingEnvelope, HoldingList, HoldingUpdate, NewHolding};

pub async fn load_portfolio_holdings(api: &ApiClient, stores: &Stores, portfolio_id: i64) {
    match api
        .get_json::<HoldingList>(&format!("api/portfolios/{portfolio_id}/holdings"))
        .await
    {
        Ok(data) => stores.apply(Snapshot::Holdings(data.holdings)),
        Err(e) => warn!(portfolio_id, "holding refresh failed: {e}"),
    }
}

pub async fn create_holding(
    api: &ApiClient,
    stores: &Stores,
    portfolio_id: i64,
    payload: &NewHolding,
) -> Result<Holding, ApiError> {
    let data: HoldingEnvelope = api
        .post_json(&format!("api/portfolios/{portfolio_id}/holdings"), payload)
        .await?;
    stores.apply(Snapshot::Holding(data.holding.clone()));
    Ok(data.holding)
}

pub async fn update_holding(
    api: &ApiClient,
    stores: &Stores,
    id: i64,
    payload: &HoldingUpdate,
) -> Result<Holding, ApiError> {
    let data: HoldingEnvelope = api.put_json(&format!("api/holdings/{id}"), payload).await?;
    stores.apply(Snapshot::Holding(data.holding.clone()));
    Ok(data.holding)
}

pub async fn delete_holding(api: &ApiClient, stores: &Stores, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("api/holdings/{id}")).await?;
    stores.apply(Snapshot::HoldingRemoved(id));
    Ok(())
}
