//! Current-user synchronization thunks

use tracing::warn;

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::store::{Snapshot, Stores};
use crate::types::{User, UserEnvelope, UserUpdate};

pub async fn load_user(api: &ApiClient, stores: &Stores, id: i64) {
    match api.get_json::<UserEnvelope>(&format!("api/users/{id}")).await {
        Ok(data) => stores.apply(Snapshot::CurrentUser(data.user)),
        Err(e) => warn!(user_id = id, "user refresh failed: {e}"),
    }
}

pub async fn update_user(
    api: &ApiClient,
    stores: &Stores,
    id: i64,
    payload: &UserUpdate,
) -> Result<User, ApiError> {
    let data: UserEnvelope = api.put_json(&format!("api/users/{id}"), payload).await?;
    stores.apply(Snapshot::CurrentUser(data.user.clone()));
    Ok(data.user)
}

/// Delete the account; the session becomes anonymous.
pub async fn delete_user(api: &ApiClient, stores: &Stores, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("api/users/{id}")).await?;
    stores.apply(Snapshot::SessionCleared);
    Ok(())
}
