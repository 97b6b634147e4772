//! Portfolio synchronization thunks

use tracing::warn;

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::store::{Snapshot, Stores};
use crate::types::{NewPortfolio, Portfolio, PortfolioEnvelope, PortfolioList, PortfolioUpdate};

/// Load every portfolio owned by the current user. Failures keep the stale
/// cache in place.
pub async fn load_portfolios(api: &ApiClient, stores: &Stores) {
    match api.get_json::<PortfolioList>("api/users/portfolios").await {
        Ok(data) => stores.apply(Snapshot::Portfolios(data.portfolios)),
        Err(e) => warn!("portfolio list refresh failed: {e}"),
    }
}

pub async fn load_portfolio(api: &ApiClient, stores: &Stores, id: i64) {
    match api
        .get_json::<PortfolioEnvelope>(&format!("api/portfolios/{id}"))
        .await
    {
        Ok(data) => stores.apply(Snapshot::Portfolio(data.portfolio)),
        Err(e) => warn!(portfolio_id = id, "portfolio refresh failed: {e}"),
    }
}

pub async fn create_portfolio(
    api: &ApiClient,
    stores: &Stores,
    payload: &NewPortfolio,
) -> Result<Portfolio, ApiError> {
    let data: PortfolioEnvelope = api.post_json("api/portfolios", payload).await?;
    stores.apply(Snapshot::Portfolio(data.portfolio.clone()));
    Ok(data.portfolio)
}

pub async fn update_portfolio(
    api: &ApiClient,
    stores: &Stores,
    id: i64,
    payload: &PortfolioUpdate,
) -> Result<Portfolio, ApiError> {
    let data: PortfolioEnvelope = api
        .put_json(&format!("api/portfolios/{id}"), payload)
        .await?;
    stores.apply(Snapshot::Portfolio(data.portfolio.clone()));
    Ok(data.portfolio)
}

/// Portfolios really are deleted server-side (funds transfer back to the
/// user's cash balance), so the cached entry is removed.
pub async fn delete_portfolio(api: &ApiClient, stores: &Stores, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("api/portfolios/{id}")).await?;
    stores.apply(Snapshot::PortfolioRemoved(id));
    Ok(())
}
